pub mod coerce;
pub mod columns;
pub mod normalize;
pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::types::NormalizedTable;

pub use columns::{canonical_column_name, rename_columns};
pub use normalize::{normalize, normalize_with_report, NormalizeReport};

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub input_file: String,
    pub output_file: String,
    #[serde(flatten)]
    pub report: NormalizeReport,
    pub columns: Vec<String>,
    pub processed_at: DateTime<Utc>,
    pub duration_secs: f64,
}

pub struct Pipeline;

impl Pipeline {
    /// Reads the raw extract, normalizes it and persists the result over `output`.
    ///
    /// This is the only writer of the normalized table. On any error the previous output, if
    /// any, is left untouched.
    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub fn run(input: &Path, output: &Path) -> Result<(NormalizedTable, PipelineResult)> {
        info!("Starting normalization pipeline");
        PipelineMetrics::record_run();
        let started = Instant::now();

        let outcome = Self::run_inner(input, output);
        let duration_secs = started.elapsed().as_secs_f64();
        PipelineMetrics::record_duration(duration_secs);

        let (table, report) = outcome.map_err(|e| {
            error!("Pipeline failed: {}", e);
            PipelineMetrics::record_failure(&e);
            e
        })?;
        PipelineMetrics::record_report(&report);

        let result = PipelineResult {
            input_file: input.display().to_string(),
            output_file: output.display().to_string(),
            report,
            columns: table.header().iter().map(|s| s.to_string()).collect(),
            processed_at: Utc::now(),
            duration_secs,
        };
        info!(
            rows_kept = result.report.rows_kept,
            duration_secs, "Pipeline finished"
        );
        Ok((table, result))
    }

    fn run_inner(input: &Path, output: &Path) -> Result<(NormalizedTable, NormalizeReport)> {
        let extract = storage::read_raw_extract(input)?;
        let (table, report) = normalize_with_report(&extract)?;
        storage::write_normalized(&table, output)?;
        Ok((table, report))
    }
}
