//! Fixed lookup tables and dashboard constants.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{InsightsError, Result};

/// Country code to country name, closed set of the 15 codes present in the listings.
pub static COUNTRIES: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "India"),
        (14, "Australia"),
        (30, "Brazil"),
        (37, "Canada"),
        (94, "Indonesia"),
        (148, "New Zealand"),
        (162, "Philippines"),
        (166, "Qatar"),
        (184, "Singapore"),
        (189, "South Africa"),
        (191, "Sri Lanka"),
        (208, "Turkey"),
        (214, "United Arab Emirates"),
        (215, "England"),
        (216, "United States of America"),
    ])
});

/// Rating color hex code to marker color name.
pub static RATING_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("3F7E00", "darkgreen"),
        ("5BA829", "green"),
        ("9ACD32", "lightgreen"),
        ("CDD614", "orange"),
        ("FFBA00", "red"),
        ("CBCBC8", "darkred"),
        ("FF7800", "darkred"),
    ])
});

pub fn country_name(country_code: i64) -> Result<&'static str> {
    COUNTRIES
        .get(&country_code)
        .copied()
        .ok_or(InsightsError::UnknownCountryCode(country_code))
}

pub fn color_name(rating_color: &str) -> Result<&'static str> {
    RATING_COLORS
        .get(rating_color)
        .copied()
        .ok_or_else(|| InsightsError::UnknownRatingColor(rating_color.to_string()))
}

/// Cell values read as missing, matching the pandas default NA token set.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

// Per-view truncation used by the cities page
pub const CITY_RANKING_LIMIT: usize = 7;
pub const CITY_CUISINE_LIMIT: usize = 10;

/// Number of highlight cards shown above the cuisines table.
pub const HIGHLIGHT_SLOTS: usize = 5;

/// Bounds of the "number of restaurants" slider.
pub const TOP_N_RANGE: std::ops::RangeInclusive<usize> = 1..=20;

pub const DEFAULT_COUNTRIES: &[&str] = &[
    "Brazil",
    "England",
    "India",
    "South Africa",
    "Canada",
    "Australia",
];

pub const DEFAULT_CUISINES: &[&str] = &[
    "Home-made",
    "BBQ",
    "Japanese",
    "Brazilian",
    "Arabian",
    "American",
    "Italian",
];

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_HIGH_RATING: f64 = 4.0;
pub const DEFAULT_LOW_RATING: f64 = 2.5;

pub const DEFAULT_RAW_PATH: &str = "data/raw/zomato.csv";
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed/data.csv";
