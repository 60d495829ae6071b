use serde::{Deserialize, Serialize};

use crate::config::FilterConfig;
use crate::types::NormalizedRecord;

/// Country and primary-cuisine restriction applied before any aggregation.
///
/// `None` leaves that dimension unrestricted; an empty list selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub countries: Option<Vec<String>>,
    pub cuisines: Option<Vec<String>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn countries<S: AsRef<str>>(mut self, countries: &[S]) -> Self {
        self.countries = Some(countries.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn cuisines<S: AsRef<str>>(mut self, cuisines: &[S]) -> Self {
        self.cuisines = Some(cuisines.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// The dashboard's default selection.
    pub fn from_config(filters: &FilterConfig) -> Self {
        Self::all()
            .countries(&filters.countries)
            .cuisines(&filters.cuisines)
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        let country_ok = self
            .countries
            .as_ref()
            .map_or(true, |c| c.iter().any(|name| *name == record.country));
        let cuisine_ok = self
            .cuisines
            .as_ref()
            .map_or(true, |c| c.iter().any(|name| *name == record.primary_cuisine));
        country_ok && cuisine_ok
    }

    /// Matching records, in table order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a NormalizedRecord>
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Inclusive bound on `aggregate_rating`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RatingThreshold {
    AtLeast(f64),
    AtMost(f64),
}

impl RatingThreshold {
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        match *self {
            RatingThreshold::AtLeast(v) => record.aggregate_rating >= v,
            RatingThreshold::AtMost(v) => record.aggregate_rating <= v,
        }
    }
}
