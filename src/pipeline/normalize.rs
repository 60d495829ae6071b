use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

use super::coerce::{parse_flag, parse_float, parse_int};
use super::columns::rename_columns;
use crate::constants::{color_name, country_name, is_missing};
use crate::error::{InsightsError, Result};
use crate::types::{
    Column, ColumnSlot, NormalizedRecord, NormalizedTable, PriceType, RawExtract, RawRecord,
};

/// Row accounting for a single normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub missing_dropped: usize,
    pub rows_kept: usize,
}

/// Turns the raw extract into the analysis-ready table.
pub fn normalize(extract: &RawExtract) -> Result<NormalizedTable> {
    normalize_with_report(extract).map(|(table, _)| table)
}

/// Runs every normalization step in order and reports how many rows each one removed.
///
/// Fails with a schema error when a required column is absent, and with a lookup error on
/// the first country or color code outside the fixed tables. Nothing is returned in either
/// case, so a failed run never yields a partial table.
#[instrument(skip(extract), fields(rows = extract.rows.len()))]
pub fn normalize_with_report(extract: &RawExtract) -> Result<(NormalizedTable, NormalizeReport)> {
    let (raw_layout, extra_columns) = resolve_layout(&extract.headers)?;
    let records = to_raw_records(extract, &raw_layout)?;

    let mut report = NormalizeReport {
        rows_read: records.len(),
        ..Default::default()
    };

    let records = drop_duplicate_ids(records);
    report.duplicates_dropped = report.rows_read - records.len();

    let before_missing = records.len();
    let records = drop_missing(records);
    report.missing_dropped = before_missing - records.len();

    let records = records
        .iter()
        .map(to_normalized)
        .collect::<Result<Vec<_>>>()?;
    report.rows_kept = records.len();

    info!(
        rows_read = report.rows_read,
        duplicates_dropped = report.duplicates_dropped,
        missing_dropped = report.missing_dropped,
        rows_kept = report.rows_kept,
        "Normalized raw extract"
    );

    let mut layout = raw_layout;
    layout.extend(Column::DERIVED.iter().map(|c| ColumnSlot::Known(*c)));

    Ok((
        NormalizedTable {
            layout,
            extra_columns,
            records,
        },
        report,
    ))
}

/// Canonicalizes the header and places every column: known raw columns by name, everything
/// else as an extra carried through verbatim.
pub fn resolve_layout(headers: &[String]) -> Result<(Vec<ColumnSlot>, Vec<String>)> {
    let names = rename_columns(headers.iter().map(String::as_str));
    let mut layout = Vec::with_capacity(names.len());
    let mut extra_columns: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for name in names {
        if !seen.insert(name.clone()) {
            return Err(InsightsError::Schema(format!(
                "duplicate column '{}' after renaming",
                name
            )));
        }
        match name.parse::<Column>() {
            Ok(column) if column.raw_index().is_some() => layout.push(ColumnSlot::Known(column)),
            Ok(column) => {
                return Err(InsightsError::Schema(format!(
                    "column '{}' is derived and cannot appear in the raw extract",
                    column
                )))
            }
            Err(_) => {
                layout.push(ColumnSlot::Extra(extra_columns.len()));
                extra_columns.push(name);
            }
        }
    }

    let missing: Vec<&str> = Column::REQUIRED
        .iter()
        .filter(|c| !layout.contains(&ColumnSlot::Known(**c)))
        .map(|c| c.name())
        .collect();
    if !missing.is_empty() {
        return Err(InsightsError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    Ok((layout, extra_columns))
}

fn to_raw_records(extract: &RawExtract, layout: &[ColumnSlot]) -> Result<Vec<RawRecord>> {
    let extra_count = layout
        .iter()
        .filter(|slot| matches!(slot, ColumnSlot::Extra(_)))
        .count();

    extract
        .rows
        .iter()
        .map(|row| {
            if row.cells.len() != layout.len() {
                return Err(InsightsError::Schema(format!(
                    "line {} has {} fields, expected {}",
                    row.line,
                    row.cells.len(),
                    layout.len()
                )));
            }
            let mut record = RawRecord {
                line: row.line,
                extras: vec![None; extra_count],
                ..Default::default()
            };
            for (slot, cell) in layout.iter().zip(&row.cells) {
                let value = (!is_missing(cell)).then(|| cell.clone());
                match slot {
                    ColumnSlot::Known(column) => {
                        if let Some(i) = column.raw_index() {
                            record.fields[i] = value;
                        }
                    }
                    ColumnSlot::Extra(i) => record.extras[*i] = value,
                }
            }
            Ok(record)
        })
        .collect()
}

/// Identity of a row's restaurant id for deduplication.
#[derive(Debug, PartialEq, Eq, Hash)]
enum IdKey {
    Missing,
    Number(i64),
    /// Not an integer; coercion rejects it later if the row survives
    Text(String),
}

impl IdKey {
    fn of(record: &RawRecord) -> Self {
        match record.get(Column::RestaurantId) {
            None => IdKey::Missing,
            Some(raw) => match parse_int(record.line, Column::RestaurantId.name(), raw) {
                Ok(id) => IdKey::Number(id),
                Err(_) => IdKey::Text(raw.to_string()),
            },
        }
    }
}

/// Keeps the first row for every restaurant id, in original order.
///
/// Ids compare by numeric value, so `7`, `7.0` and `007` are the same restaurant.
pub fn drop_duplicate_ids(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen: HashSet<IdKey> = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let key = IdKey::of(record);
            let first = seen.insert(key);
            if !first {
                debug!(line = record.line, "Dropping duplicate restaurant id");
            }
            first
        })
        .collect()
}

/// Drops every row with a missing cell in any column, extras included.
pub fn drop_missing(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records
        .into_iter()
        .filter(|record| {
            let complete = !record.has_missing();
            if !complete {
                debug!(line = record.line, "Dropping row with missing values");
            }
            complete
        })
        .collect()
}

/// First comma-separated token of the cuisines list.
pub fn primary_cuisine(cuisines: &str) -> String {
    cuisines.split(',').next().unwrap_or_default().to_string()
}

fn to_normalized(record: &RawRecord) -> Result<NormalizedRecord> {
    let line = record.line;
    let cell = |column: Column| -> Result<&str> {
        record.get(column).ok_or_else(|| {
            InsightsError::Schema(format!("line {} is missing '{}'", line, column))
        })
    };
    let int = |column: Column| cell(column).and_then(|v| parse_int(line, column.name(), v));
    let float = |column: Column| cell(column).and_then(|v| parse_float(line, column.name(), v));
    let flag = |column: Column| cell(column).and_then(|v| parse_flag(line, column.name(), v));

    let country_code = int(Column::CountryCode)?;
    let price_range = int(Column::PriceRange)?;
    let rating_color = cell(Column::RatingColor)?.to_string();
    let cuisines = cell(Column::Cuisines)?.to_string();

    let country = country_name(country_code).map_err(|e| {
        error!(line, country_code, "Country code has no entry in the country table");
        e
    })?;
    let color = color_name(&rating_color).map_err(|e| {
        error!(line, rating_color = %rating_color, "Rating color has no entry in the color table");
        e
    })?;

    Ok(NormalizedRecord {
        restaurant_id: int(Column::RestaurantId)?,
        restaurant_name: cell(Column::RestaurantName)?.to_string(),
        country_code,
        city: cell(Column::City)?.to_string(),
        primary_cuisine: primary_cuisine(&cuisines),
        cuisines,
        average_cost_for_two: float(Column::AverageCostForTwo)?,
        currency: cell(Column::Currency)?.to_string(),
        has_table_booking: flag(Column::HasTableBooking)?,
        has_online_delivery: flag(Column::HasOnlineDelivery)?,
        is_delivering_now: flag(Column::IsDeliveringNow)?,
        aggregate_rating: float(Column::AggregateRating)?,
        rating_color,
        votes: int(Column::Votes)?,
        price_range,
        latitude: float(Column::Latitude)?,
        longitude: float(Column::Longitude)?,
        country: country.to_string(),
        price_type: PriceType::from_price_range(price_range),
        color_name: color.to_string(),
        extras: record.extras.iter().flatten().cloned().collect(),
    })
}
