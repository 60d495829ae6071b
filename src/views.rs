//! Everything each dashboard page displays, computed from the normalized table.
//!
//! Pages only compute; drawing the charts and maps is left to the caller.

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::insights::queries::{self, Highlight, MapMarker, Overview};
use crate::insights::{RatingThreshold, Selection, SortOrder, Summary};
use crate::types::{Column, NormalizedTable};

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub overview: Overview,
    pub markers: Vec<MapMarker>,
}

impl HomePage {
    /// The home page always covers the whole table.
    #[instrument(skip_all)]
    pub fn build(table: &NormalizedTable) -> Self {
        Self {
            overview: queries::overview(&table.records),
            markers: queries::map_markers(&table.records),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountriesPage {
    pub restaurants_per_country: Summary,
    pub cities_per_country: Summary,
    pub mean_rating: Summary,
    pub mean_price_range: Summary,
}

impl CountriesPage {
    /// Only the country part of `selection` applies on this page.
    #[instrument(skip_all)]
    pub fn build(table: &NormalizedTable, selection: &Selection) -> Result<Self> {
        let records = country_only(selection).apply(&table.records);
        info!(rows = records.len(), "Building countries page");
        Ok(Self {
            restaurants_per_country: queries::count_distinct_by_country(
                records.iter().copied(),
                Column::RestaurantId,
                "number_of_restaurants",
            )?,
            cities_per_country: queries::count_distinct_by_country(
                records.iter().copied(),
                Column::City,
                "number_of_cities",
            )?,
            mean_rating: queries::mean_by_country(records.iter().copied(), Column::AggregateRating)?,
            mean_price_range: queries::mean_by_country(records.iter().copied(), Column::PriceRange)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CitiesPage {
    pub highest_mean_rating: Summary,
    pub lowest_mean_rating: Summary,
    pub highest_mean_price_range: Summary,
    pub lowest_mean_price_range: Summary,
    pub most_rated_above: Summary,
    pub most_rated_below: Summary,
    pub most_cuisines: Summary,
}

impl CitiesPage {
    /// Only the country part of `selection` applies on this page.
    #[instrument(skip_all)]
    pub fn build(table: &NormalizedTable, selection: &Selection, config: &Config) -> Result<Self> {
        let records = country_only(selection).apply(&table.records);
        info!(rows = records.len(), "Building cities page");
        let rows = || records.iter().copied();
        Ok(Self {
            highest_mean_rating: queries::city_mean_ranking(
                rows(),
                Column::AggregateRating,
                SortOrder::Descending,
            )?,
            lowest_mean_rating: queries::city_mean_ranking(
                rows(),
                Column::AggregateRating,
                SortOrder::Ascending,
            )?,
            highest_mean_price_range: queries::city_mean_ranking(
                rows(),
                Column::PriceRange,
                SortOrder::Descending,
            )?,
            lowest_mean_price_range: queries::city_mean_ranking(
                rows(),
                Column::PriceRange,
                SortOrder::Ascending,
            )?,
            most_rated_above: queries::city_rating_count(
                rows(),
                RatingThreshold::AtLeast(config.thresholds.high_rating),
            )?,
            most_rated_below: queries::city_rating_count(
                rows(),
                RatingThreshold::AtMost(config.thresholds.low_rating),
            )?,
            most_cuisines: queries::city_unique_cuisines(rows())?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CuisinesPage {
    /// Requested restaurant count after clamping to the selected rows
    pub top_n: usize,
    pub highlights: Vec<Highlight>,
    pub top_restaurants: Summary,
    pub mean_rating_by_cuisine: Summary,
    pub mean_price_range_by_cuisine: Summary,
}

impl CuisinesPage {
    #[instrument(skip(table, selection))]
    pub fn build(table: &NormalizedTable, selection: &Selection, top_n: usize) -> Result<Self> {
        let records = selection.apply(&table.records);
        let top_n = top_n.min(records.len());
        info!(rows = records.len(), top_n, "Building cuisines page");
        let rows = || records.iter().copied();
        Ok(Self {
            top_n,
            highlights: queries::highlights(rows(), top_n),
            top_restaurants: queries::top_restaurants(rows(), top_n)?,
            mean_rating_by_cuisine: queries::cuisine_mean(
                rows(),
                Column::AggregateRating,
                SortOrder::Descending,
            )?,
            mean_price_range_by_cuisine: queries::cuisine_mean(
                rows(),
                Column::PriceRange,
                SortOrder::Descending,
            )?,
        })
    }
}

fn country_only(selection: &Selection) -> Selection {
    Selection {
        countries: selection.countries.clone(),
        cuisines: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::record;

    fn table() -> NormalizedTable {
        let mut records = vec![
            record(1, "Rio", "Brazil", 4.6),
            record(2, "Rio", "Brazil", 2.1),
            record(3, "London", "England", 3.0),
            record(4, "Pune", "India", 4.1),
        ];
        records[2].primary_cuisine = "British".to_string();
        NormalizedTable {
            records,
            ..Default::default()
        }
    }

    #[test]
    fn test_countries_page_ignores_cuisine_selection() {
        let selection = Selection::all()
            .countries(&["Brazil", "England"])
            .cuisines(&["Japanese"]);
        let page = CountriesPage::build(&table(), &selection).unwrap();
        assert_eq!(page.restaurants_per_country.len(), 2);
        assert_eq!(page.restaurants_per_country.value_of("Brazil"), Some(2.0));
        assert_eq!(page.mean_rating.metric_label, "Mean Aggregate Rating");
        assert_eq!(page.mean_price_range.metric_label, "Mean Price Range");
    }

    #[test]
    fn test_cities_page_thresholds_come_from_config() {
        let page = CitiesPage::build(&table(), &Selection::all(), &Config::default()).unwrap();
        let above: Vec<&str> = page
            .most_rated_above
            .rows
            .iter()
            .map(|r| r.key[0].as_str())
            .collect();
        assert_eq!(above, vec!["Rio", "Pune"]);
        assert_eq!(page.most_rated_below.value_of("Rio"), Some(1.0));
        assert_eq!(page.lowest_mean_rating.rows[0].key, vec!["London", "England"]);
    }

    #[test]
    fn test_cuisines_page_clamps_top_n() {
        let selection = Selection::all().cuisines(&["Italian"]);
        let page = CuisinesPage::build(&table(), &selection, 10).unwrap();
        assert_eq!(page.top_n, 3);
        assert_eq!(page.highlights.len(), 3);
        assert_eq!(page.top_restaurants.len(), 3);
        assert_eq!(page.mean_rating_by_cuisine.len(), 1);
    }

    #[test]
    fn test_empty_selection_renders_empty_pages() {
        let selection = Selection::all().countries::<&str>(&[]);
        let page = CuisinesPage::build(&table(), &selection, 5).unwrap();
        assert_eq!(page.top_n, 0);
        assert!(page.highlights.is_empty());
        assert!(page.top_restaurants.is_empty());

        let cities = CitiesPage::build(&table(), &selection, &Config::default()).unwrap();
        assert!(cities.most_cuisines.is_empty());
    }

    #[test]
    fn test_home_page_covers_whole_table() {
        let page = HomePage::build(&table());
        assert_eq!(page.overview.restaurants, 4);
        assert_eq!(page.markers.len(), 4);
    }
}
