use thiserror::Error;

use crate::types::Column;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid value {value:?} for column '{column}' on line {line}: expected {expected}")]
    Field {
        line: u64,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown country code: {0}")]
    UnknownCountryCode(i64),

    #[error("Unknown rating color: {0}")]
    UnknownRatingColor(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(Column),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl InsightsError {
    /// True for failures caused by a country or color code missing from the fixed tables.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            InsightsError::UnknownCountryCode(_) | InsightsError::UnknownRatingColor(_)
        )
    }

    /// True for failures caused by malformed or incomplete tabular input.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            InsightsError::Schema(_) | InsightsError::Field { .. } | InsightsError::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
