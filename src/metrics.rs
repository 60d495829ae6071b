//! Metrics for the normalization pipeline and the aggregation layer.
//!
//! Recording is a no-op until [`init_metrics`] installs the in-process Prometheus recorder,
//! so library callers and tests never need to set anything up.

use std::sync::{Once, OnceLock};
use tracing::{info, warn};

use crate::error::InsightsError;
use crate::pipeline::NormalizeReport;

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

pub const PIPELINE_RUNS: &str = "insights_pipeline_runs_total";
pub const PIPELINE_FAILURES: &str = "insights_pipeline_failures_total";
pub const PIPELINE_DURATION: &str = "insights_pipeline_duration_seconds";
pub const ROWS_READ: &str = "insights_rows_read_total";
pub const ROWS_DROPPED: &str = "insights_rows_dropped_total";
pub const ROWS_WRITTEN: &str = "insights_rows_written_total";
pub const QUERIES: &str = "insights_queries_total";

/// Install the global Prometheus recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("METRICS: handle already stored");
                }
                info!("Prometheus recorder installed (in-process render only)");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Prometheus exposition text for everything recorded so far, if the recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_run() {
        ::metrics::counter!(PIPELINE_RUNS).increment(1);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(PIPELINE_DURATION).record(duration_secs);
    }

    pub fn record_failure(error: &InsightsError) {
        let kind = if error.is_lookup() {
            "lookup"
        } else if error.is_schema() {
            "schema"
        } else {
            "io"
        };
        ::metrics::counter!(PIPELINE_FAILURES, "kind" => kind).increment(1);
    }

    pub fn record_report(report: &NormalizeReport) {
        ::metrics::counter!(ROWS_READ).increment(report.rows_read as u64);
        ::metrics::counter!(ROWS_DROPPED, "reason" => "duplicate")
            .increment(report.duplicates_dropped as u64);
        ::metrics::counter!(ROWS_DROPPED, "reason" => "missing")
            .increment(report.missing_dropped as u64);
        ::metrics::counter!(ROWS_WRITTEN).increment(report.rows_kept as u64);
    }
}

pub struct QueryMetrics;

impl QueryMetrics {
    pub fn record_query(query: &'static str) {
        ::metrics::counter!(QUERIES, "query" => query).increment(1);
    }
}
