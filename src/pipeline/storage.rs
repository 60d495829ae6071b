//! Reading the raw extract and persisting/loading the normalized table as CSV.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use super::coerce::{parse_flag, parse_float, parse_int};
use crate::error::{InsightsError, Result};
use crate::types::{Column, ColumnSlot, NormalizedRecord, NormalizedTable, RawExtract, RawRow};

pub fn read_raw_extract(path: &Path) -> Result<RawExtract> {
    let file = fs::File::open(path).map_err(|e| {
        InsightsError::Schema(format!("cannot open raw extract '{}': {}", path.display(), e))
    })?;
    read_raw_extract_from(file)
}

/// Reads a comma-separated extract with a header row. Cells stay text.
pub fn read_raw_extract_from<R: io::Read>(reader: R) -> Result<RawExtract> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(InsightsError::Schema("raw extract has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);
        rows.push(RawRow {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    debug!(columns = headers.len(), rows = rows.len(), "Read raw extract");
    Ok(RawExtract { headers, rows })
}

/// Writes the normalized table, fully replacing any previous output at `path`.
///
/// Rows go to a sibling temporary file first and are renamed into place once complete.
pub fn write_normalized(table: &NormalizedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("csv.tmp");
    let written = fs::File::create(&tmp_path)
        .map_err(InsightsError::from)
        .and_then(|file| write_normalized_to(table, file))
        .and_then(|()| fs::rename(&tmp_path, path).map_err(InsightsError::from));
    if let Err(e) = written {
        if tmp_path.exists() {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), "Failed to remove temporary output: {}", cleanup);
            }
        }
        return Err(e);
    }
    info!(path = %path.display(), rows = table.len(), "Wrote normalized table");
    Ok(())
}

pub fn write_normalized_to<W: io::Write>(table: &NormalizedTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.header())?;
    for record in &table.records {
        let row = table.layout.iter().map(|slot| match slot {
            ColumnSlot::Known(column) => record.text(*column),
            ColumnSlot::Extra(i) => record.extras.get(*i).cloned().unwrap_or_default(),
        });
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_normalized(path: &Path) -> Result<NormalizedTable> {
    let file = fs::File::open(path).map_err(|e| {
        InsightsError::Config(format!(
            "cannot open normalized table '{}' (run `normalize` first?): {}",
            path.display(),
            e
        ))
    })?;
    read_normalized_from(file)
}

/// Loads a table previously written by [`write_normalized`]. Headers must already be canonical.
pub fn read_normalized_from<R: io::Read>(reader: R) -> Result<NormalizedTable> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut layout = Vec::with_capacity(headers.len());
    let mut extra_columns = Vec::new();
    let mut positions: HashMap<Column, usize> = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        match name.parse::<Column>() {
            Ok(column) => {
                if positions.insert(column, i).is_some() {
                    return Err(InsightsError::Schema(format!("duplicate column '{}'", name)));
                }
                layout.push(ColumnSlot::Known(column));
            }
            Err(_) => {
                layout.push(ColumnSlot::Extra(extra_columns.len()));
                extra_columns.push(name.clone());
            }
        }
    }
    let missing: Vec<&str> = Column::REQUIRED
        .iter()
        .chain(Column::DERIVED.iter())
        .filter(|c| !positions.contains_key(c))
        .map(|c| c.name())
        .collect();
    if !missing.is_empty() {
        return Err(InsightsError::Schema(format!(
            "normalized table is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        let cell = |column: Column| -> Result<&str> {
            let value = positions
                .get(&column)
                .and_then(|p| row.get(*p))
                .unwrap_or_default();
            if value.is_empty() {
                return Err(InsightsError::Schema(format!(
                    "normalized table has an empty '{}' on line {}",
                    column, line
                )));
            }
            Ok(value)
        };
        let int = |column: Column| cell(column).and_then(|v| parse_int(line, column.name(), v));
        let float = |column: Column| cell(column).and_then(|v| parse_float(line, column.name(), v));
        let flag = |column: Column| cell(column).and_then(|v| parse_flag(line, column.name(), v));

        let extras = layout
            .iter()
            .zip(row.iter())
            .filter(|(slot, _)| matches!(slot, ColumnSlot::Extra(_)))
            .map(|(_, value)| value.to_string())
            .collect();

        records.push(NormalizedRecord {
            restaurant_id: int(Column::RestaurantId)?,
            restaurant_name: cell(Column::RestaurantName)?.to_string(),
            country_code: int(Column::CountryCode)?,
            city: cell(Column::City)?.to_string(),
            cuisines: cell(Column::Cuisines)?.to_string(),
            average_cost_for_two: float(Column::AverageCostForTwo)?,
            currency: cell(Column::Currency)?.to_string(),
            has_table_booking: flag(Column::HasTableBooking)?,
            has_online_delivery: flag(Column::HasOnlineDelivery)?,
            is_delivering_now: flag(Column::IsDeliveringNow)?,
            aggregate_rating: float(Column::AggregateRating)?,
            rating_color: cell(Column::RatingColor)?.to_string(),
            votes: int(Column::Votes)?,
            price_range: int(Column::PriceRange)?,
            latitude: float(Column::Latitude)?,
            longitude: float(Column::Longitude)?,
            country: cell(Column::Country)?.to_string(),
            price_type: cell(Column::PriceType)?.parse()?,
            color_name: cell(Column::ColorName)?.to_string(),
            primary_cuisine: cell(Column::PrimaryCuisine)?.to_string(),
            extras,
        });
    }

    debug!(rows = records.len(), "Loaded normalized table");
    Ok(NormalizedTable {
        layout,
        extra_columns,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
Restaurant ID,Restaurant Name,Country Code,City,Address,Cuisines,Average Cost for two,Currency,Has Table booking,Has Online delivery,Is delivering now,Aggregate rating,Rating color,Votes,Price range,Latitude,Longitude
6317637,Le Petit Souffle,162,Makati City,\"Third Floor, Century City Mall\",\"French, Japanese, Desserts\",1100,Botswana Pula(P),1,0,0,4.8,3F7E00,314,3,14.565443,121.027535
";

    #[test]
    fn test_read_raw_keeps_labels_and_quoted_cells() {
        let extract = read_raw_extract_from(RAW.as_bytes()).unwrap();
        assert_eq!(extract.headers[0], "Restaurant ID");
        assert_eq!(extract.rows.len(), 1);
        assert_eq!(extract.rows[0].line, 2);
        assert_eq!(extract.rows[0].cells[4], "Third Floor, Century City Mall");
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let input = "a,b\n1,2,3\n";
        let err = read_raw_extract_from(input.as_bytes()).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_failed_replace_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let extract = read_raw_extract_from(RAW.as_bytes()).unwrap();
        let table = crate::pipeline::normalize::normalize(&extract).unwrap();

        // A non-empty directory in place of the output makes the final rename fail
        let target = dir.path().join("data.csv");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        assert!(write_normalized(&table, &target).is_err());
        assert!(!dir.path().join("data.csv.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_written_table_loads_back_unchanged() {
        let extract = read_raw_extract_from(RAW.as_bytes()).unwrap();
        let table = crate::pipeline::normalize::normalize(&extract).unwrap();

        let mut buf = Vec::new();
        write_normalized_to(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("restaurant_id,restaurant_name,country_code,city,address,"));
        assert!(header.ends_with(",country,price_type,color_name,cuisines_"));
        assert!(text.contains(",true,false,false,"));

        let loaded = read_normalized_from(buf.as_slice()).unwrap();
        assert_eq!(loaded.records, table.records);
        assert_eq!(loaded.header(), table.header());
    }
}
