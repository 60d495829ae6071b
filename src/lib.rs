pub mod config;
pub mod constants;
pub mod error;
pub mod insights;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;
pub mod views;

pub use error::{InsightsError, Result};
pub use types::{Column, NormalizedRecord, NormalizedTable, PriceType};
