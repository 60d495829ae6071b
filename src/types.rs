use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InsightsError;

/// A named column of the normalized restaurant table.
///
/// The first sixteen variants are the raw extract's columns (after canonical renaming),
/// the last four are derived by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    RestaurantId,
    RestaurantName,
    CountryCode,
    City,
    Cuisines,
    AverageCostForTwo,
    Currency,
    HasTableBooking,
    HasOnlineDelivery,
    IsDeliveringNow,
    AggregateRating,
    RatingColor,
    Votes,
    PriceRange,
    Latitude,
    Longitude,
    Country,
    PriceType,
    ColorName,
    #[serde(rename = "cuisines_")]
    PrimaryCuisine,
}

impl Column {
    /// Columns every raw extract must provide.
    pub const REQUIRED: [Column; 16] = [
        Column::RestaurantId,
        Column::RestaurantName,
        Column::CountryCode,
        Column::City,
        Column::Cuisines,
        Column::AverageCostForTwo,
        Column::Currency,
        Column::HasTableBooking,
        Column::HasOnlineDelivery,
        Column::IsDeliveringNow,
        Column::AggregateRating,
        Column::RatingColor,
        Column::Votes,
        Column::PriceRange,
        Column::Latitude,
        Column::Longitude,
    ];

    /// Derived columns, in the order they are appended to the output.
    pub const DERIVED: [Column; 4] = [
        Column::Country,
        Column::PriceType,
        Column::ColorName,
        Column::PrimaryCuisine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::RestaurantId => "restaurant_id",
            Column::RestaurantName => "restaurant_name",
            Column::CountryCode => "country_code",
            Column::City => "city",
            Column::Cuisines => "cuisines",
            Column::AverageCostForTwo => "average_cost_for_two",
            Column::Currency => "currency",
            Column::HasTableBooking => "has_table_booking",
            Column::HasOnlineDelivery => "has_online_delivery",
            Column::IsDeliveringNow => "is_delivering_now",
            Column::AggregateRating => "aggregate_rating",
            Column::RatingColor => "rating_color",
            Column::Votes => "votes",
            Column::PriceRange => "price_range",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::Country => "country",
            Column::PriceType => "price_type",
            Column::ColorName => "color_name",
            Column::PrimaryCuisine => "cuisines_",
        }
    }

    /// Position within [`Column::REQUIRED`], `None` for derived columns.
    pub fn raw_index(self) -> Option<usize> {
        Self::REQUIRED.iter().position(|c| *c == self)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Column::RestaurantId
                | Column::CountryCode
                | Column::AverageCostForTwo
                | Column::AggregateRating
                | Column::Votes
                | Column::PriceRange
                | Column::Latitude
                | Column::Longitude
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::REQUIRED
            .iter()
            .chain(Self::DERIVED.iter())
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| InsightsError::UnknownColumn(s.to_string()))
    }
}

/// Ordinal price bucket derived from `price_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Cheap,
    Normal,
    Expensive,
    Gourmet,
}

impl PriceType {
    /// 1, 2 and 3 map to their own bucket; 4 and every out-of-range value collapse to gourmet.
    pub fn from_price_range(price_range: i64) -> Self {
        match price_range {
            1 => PriceType::Cheap,
            2 => PriceType::Normal,
            3 => PriceType::Expensive,
            _ => PriceType::Gourmet,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceType::Cheap => "cheap",
            PriceType::Normal => "normal",
            PriceType::Expensive => "expensive",
            PriceType::Gourmet => "gourmet",
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cheap" => Ok(PriceType::Cheap),
            "normal" => Ok(PriceType::Normal),
            "expensive" => Ok(PriceType::Expensive),
            "gourmet" => Ok(PriceType::Gourmet),
            other => Err(InsightsError::Schema(format!("unknown price type '{}'", other))),
        }
    }
}

/// Where a column of a table lives: one of the known columns or an extra carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSlot {
    Known(Column),
    Extra(usize),
}

/// One unprocessed row of the raw extract, cells still as text.
///
/// `None` marks a missing cell.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// 1-based line in the source file, header included
    pub line: u64,
    pub fields: [Option<String>; 16],
    pub extras: Vec<Option<String>>,
}

impl RawRecord {
    pub fn get(&self, column: Column) -> Option<&str> {
        column
            .raw_index()
            .and_then(|i| self.fields[i].as_deref())
    }

    pub fn has_missing(&self) -> bool {
        self.fields.iter().any(Option::is_none) || self.extras.iter().any(Option::is_none)
    }
}

/// The raw extract exactly as read: header labels as they appear in the file and text rows.
#[derive(Debug, Clone, Default)]
pub struct RawExtract {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub line: u64,
    pub cells: Vec<String>,
}

/// A cleaned, analysis-ready restaurant listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub country_code: i64,
    pub city: String,
    pub cuisines: String,
    pub average_cost_for_two: f64,
    pub currency: String,
    pub has_table_booking: bool,
    pub has_online_delivery: bool,
    pub is_delivering_now: bool,
    pub aggregate_rating: f64,
    pub rating_color: String,
    pub votes: i64,
    pub price_range: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub price_type: PriceType,
    pub color_name: String,
    #[serde(rename = "cuisines_")]
    pub primary_cuisine: String,
    #[serde(skip)]
    pub extras: Vec<String>,
}

impl NormalizedRecord {
    /// Text form of a column, as written to the normalized file and used for grouping.
    pub fn text(&self, column: Column) -> String {
        match column {
            Column::RestaurantId => self.restaurant_id.to_string(),
            Column::RestaurantName => self.restaurant_name.clone(),
            Column::CountryCode => self.country_code.to_string(),
            Column::City => self.city.clone(),
            Column::Cuisines => self.cuisines.clone(),
            Column::AverageCostForTwo => self.average_cost_for_two.to_string(),
            Column::Currency => self.currency.clone(),
            Column::HasTableBooking => self.has_table_booking.to_string(),
            Column::HasOnlineDelivery => self.has_online_delivery.to_string(),
            Column::IsDeliveringNow => self.is_delivering_now.to_string(),
            Column::AggregateRating => self.aggregate_rating.to_string(),
            Column::RatingColor => self.rating_color.clone(),
            Column::Votes => self.votes.to_string(),
            Column::PriceRange => self.price_range.to_string(),
            Column::Latitude => self.latitude.to_string(),
            Column::Longitude => self.longitude.to_string(),
            Column::Country => self.country.clone(),
            Column::PriceType => self.price_type.to_string(),
            Column::ColorName => self.color_name.clone(),
            Column::PrimaryCuisine => self.primary_cuisine.clone(),
        }
    }

    /// Numeric value of a column, `None` when the column is not numeric.
    pub fn number(&self, column: Column) -> Option<f64> {
        match column {
            Column::RestaurantId => Some(self.restaurant_id as f64),
            Column::CountryCode => Some(self.country_code as f64),
            Column::AverageCostForTwo => Some(self.average_cost_for_two),
            Column::AggregateRating => Some(self.aggregate_rating),
            Column::Votes => Some(self.votes as f64),
            Column::PriceRange => Some(self.price_range as f64),
            Column::Latitude => Some(self.latitude),
            Column::Longitude => Some(self.longitude),
            _ => None,
        }
    }
}

/// The full normalized table: output column layout plus records in original order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub layout: Vec<ColumnSlot>,
    pub extra_columns: Vec<String>,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    /// Output header, in layout order.
    pub fn header(&self) -> Vec<&str> {
        self.layout
            .iter()
            .map(|slot| match slot {
                ColumnSlot::Known(column) => column.name(),
                ColumnSlot::Extra(i) => self.extra_columns[*i].as_str(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_type_mapping() {
        let mapped: Vec<&str> = [1, 2, 3, 4, 5]
            .into_iter()
            .map(|p| PriceType::from_price_range(p).as_str())
            .collect();
        assert_eq!(mapped, vec!["cheap", "normal", "expensive", "gourmet", "gourmet"]);
        assert_eq!(PriceType::from_price_range(0), PriceType::Gourmet);
        assert_eq!(PriceType::from_price_range(-1), PriceType::Gourmet);
    }

    #[test]
    fn test_column_names_round_trip_through_from_str() {
        for column in Column::REQUIRED.iter().chain(Column::DERIVED.iter()) {
            assert_eq!(column.name().parse::<Column>().unwrap(), *column);
        }
        assert!("address".parse::<Column>().is_err());
    }

    #[test]
    fn test_raw_index_only_for_required_columns() {
        assert_eq!(Column::RestaurantId.raw_index(), Some(0));
        assert_eq!(Column::Longitude.raw_index(), Some(15));
        assert_eq!(Column::Country.raw_index(), None);
    }
}
