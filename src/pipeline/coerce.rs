//! Cell-level type coercion shared by the raw and normalized readers.

use crate::error::{InsightsError, Result};

fn field_error(line: u64, column: &str, value: &str, expected: &'static str) -> InsightsError {
    InsightsError::Field {
        line,
        column: column.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Integers written as `30`, `030` or as a float with no fraction (`30.0`).
///
/// Integral floats outside the `i64` range are rejected rather than saturated.
pub fn parse_int(line: u64, column: &str, value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => Ok(v as i64),
        _ => Err(field_error(line, column, value, "an integer")),
    }
}

pub fn parse_float(line: u64, column: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(field_error(line, column, value, "a number")),
    }
}

/// Truthiness of a raw flag cell: numbers are true when non-zero, plus the usual words.
pub fn parse_flag(line: u64, column: &str, value: &str) -> Result<bool> {
    let trimmed = value.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Ok(v != 0.0);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "t" => Ok(true),
        "false" | "no" | "n" | "f" => Ok(false),
        _ => Err(field_error(line, column, value, "a boolean flag")),
    }
}
