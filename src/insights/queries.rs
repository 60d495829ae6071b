//! One query per dashboard metric, each a fixed parameterization of [`aggregate`].

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::filters::RatingThreshold;
use super::{aggregate, AggregateQuery, Aggregation, SortOrder, Summary};
use crate::constants::{CITY_CUISINE_LIMIT, CITY_RANKING_LIMIT, HIGHLIGHT_SLOTS};
use crate::error::Result;
use crate::metrics::QueryMetrics;
use crate::types::{Column, NormalizedRecord};

const CITY_KEY: &[Column] = &[Column::City, Column::Country];

/// Distinct values of `column` per country, most first.
pub fn count_distinct_by_country<'a, I>(records: I, column: Column, metric: &str) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("count_distinct_by_country");
    let query = AggregateQuery::new(&[Column::Country], Aggregation::DistinctCount(column))
        .named(metric);
    aggregate(records, &query)
}

/// Mean of `column` per country, highest first, labelled `mean_<column>`.
pub fn mean_by_country<'a, I>(records: I, column: Column) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("mean_by_country");
    let query = AggregateQuery::new(&[Column::Country], Aggregation::Mean(column));
    aggregate(records, &query)
}

/// The seven (city, country) groups with the highest or lowest mean of `column`.
pub fn city_mean_ranking<'a, I>(records: I, column: Column, order: SortOrder) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("city_mean_ranking");
    let query = AggregateQuery::new(CITY_KEY, Aggregation::Mean(column))
        .order(order)
        .limit(CITY_RANKING_LIMIT);
    aggregate(records, &query)
}

/// The seven cities with the most restaurants on the given side of a rating threshold.
pub fn city_rating_count<'a, I>(records: I, threshold: RatingThreshold) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("city_rating_count");
    let query = AggregateQuery::new(CITY_KEY, Aggregation::Count).limit(CITY_RANKING_LIMIT);
    aggregate(
        records.into_iter().filter(|r| threshold.matches(r)),
        &query,
    )
}

/// The ten cities offering the most distinct primary cuisines.
pub fn city_unique_cuisines<'a, I>(records: I) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("city_unique_cuisines");
    let query = AggregateQuery::new(CITY_KEY, Aggregation::DistinctCount(Column::PrimaryCuisine))
        .named("number_of_unique_cuisines")
        .limit(CITY_CUISINE_LIMIT);
    aggregate(records, &query)
}

/// Mean of `column` per primary cuisine, untruncated.
pub fn cuisine_mean<'a, I>(records: I, column: Column, order: SortOrder) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("cuisine_mean");
    let query =
        AggregateQuery::new(&[Column::PrimaryCuisine], Aggregation::Mean(column)).order(order);
    aggregate(records, &query)
}

/// Best rated restaurants as a table: mean rating per restaurant listing, top `n`.
pub fn top_restaurants<'a, I>(records: I, n: usize) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("top_restaurants");
    let query = AggregateQuery::new(
        &[
            Column::RestaurantName,
            Column::Country,
            Column::City,
            Column::PrimaryCuisine,
            Column::AverageCostForTwo,
            Column::Votes,
        ],
        Aggregation::Mean(Column::AggregateRating),
    )
    .limit(n)
    .decimals(None);
    aggregate(records, &query)
}

/// The first `n` records by aggregate rating, highest first, ungrouped.
///
/// Equal ratings keep table order. Asking for more rows than exist returns all of them.
pub fn top_rated<'a, I>(records: I, n: usize) -> Vec<&'a NormalizedRecord>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("top_rated");
    let mut sorted: Vec<&NormalizedRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.aggregate_rating.total_cmp(&a.aggregate_rating));
    sorted.truncate(n);
    sorted
}

/// One highlight card above the cuisines table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    /// `"<cuisine>: <restaurant>"`
    pub label: String,
    /// `"<rating>/5.0"`, with the rating as stored
    pub value: String,
    pub country: String,
    pub city: String,
    /// `"<price_range>/4"`
    pub price_scale: String,
}

impl From<&NormalizedRecord> for Highlight {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            label: format!("{}: {}", record.primary_cuisine, record.restaurant_name),
            value: format!("{:?}/5.0", record.aggregate_rating),
            country: record.country.clone(),
            city: record.city.clone(),
            price_scale: format!("{}/4", record.price_range),
        }
    }
}

/// Highlight cards for the top `n` rated records, at most five, fewer when fewer remain.
pub fn highlights<'a, I>(records: I, n: usize) -> Vec<Highlight>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let top = top_rated(records, n);
    let slots = top.len().min(HIGHLIGHT_SLOTS);
    debug!(available = top.len(), slots, "Building highlight cards");
    top.into_iter().take(slots).map(Highlight::from).collect()
}

/// Headline counts shown on the home page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub restaurants: usize,
    pub countries: usize,
    pub cities: usize,
    pub votes: i64,
    pub cuisines: usize,
}

pub fn overview<'a, I>(records: I) -> Overview
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("overview");
    let mut countries = HashSet::new();
    let mut cities = HashSet::new();
    let mut cuisines = HashSet::new();
    let mut summary = Overview::default();
    for record in records {
        summary.restaurants += 1;
        summary.votes += record.votes;
        countries.insert(record.country.as_str());
        cities.insert(record.city.as_str());
        cuisines.insert(record.primary_cuisine.as_str());
    }
    summary.countries = countries.len();
    summary.cities = cities.len();
    summary.cuisines = cuisines.len();
    summary
}

/// A clustered map marker with its popup contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub restaurant_name: String,
    /// `"<cost>,00 (<currency>) for two"`
    pub price: String,
    pub cuisines: String,
    pub aggregate_rating: f64,
    /// Icon color, from the rating color table
    pub color: String,
}

pub fn map_markers<'a, I>(records: I) -> Vec<MapMarker>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    QueryMetrics::record_query("map_markers");
    records
        .into_iter()
        .map(|r| MapMarker {
            latitude: r.latitude,
            longitude: r.longitude,
            restaurant_name: r.restaurant_name.clone(),
            price: format!("{},00 ({}) for two", r.average_cost_for_two, r.currency),
            cuisines: r.cuisines.clone(),
            aggregate_rating: r.aggregate_rating,
            color: r.color_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::record;
    use super::*;

    #[test]
    fn test_restaurant_and_city_counts_per_country() {
        let records = vec![
            record(1, "Rio", "Brazil", 4.0),
            record(2, "Rio", "Brazil", 4.0),
            record(3, "Brasília", "Brazil", 4.0),
            record(4, "London", "England", 4.0),
        ];
        let restaurants =
            count_distinct_by_country(&records, Column::RestaurantId, "number_of_restaurants")
                .unwrap();
        assert_eq!(restaurants.value_of("Brazil"), Some(3.0));
        assert_eq!(restaurants.metric_label, "Number Of Restaurants");

        let cities = count_distinct_by_country(&records, Column::City, "number_of_cities").unwrap();
        assert_eq!(cities.rows[0].key, vec!["Brazil"]);
        assert_eq!(cities.rows[0].value, 2.0);
        assert_eq!(cities.value_of("England"), Some(1.0));
    }

    #[test]
    fn test_rating_threshold_is_inclusive() {
        let records = vec![
            record(1, "A", "India", 4.0),
            record(2, "A", "India", 3.9),
            record(3, "B", "India", 4.5),
        ];
        let above = city_rating_count(&records, RatingThreshold::AtLeast(4.0)).unwrap();
        assert_eq!(above.value_of("A"), Some(1.0));
        assert_eq!(above.value_of("B"), Some(1.0));
        assert_eq!(above.metric, "count");

        let below = city_rating_count(&records, RatingThreshold::AtMost(3.9)).unwrap();
        assert_eq!(below.len(), 1);
        assert_eq!(below.rows[0].key, vec!["A", "India"]);
    }

    #[test]
    fn test_unique_cuisines_truncates_to_ten() {
        let mut records = Vec::new();
        for i in 0..12 {
            let mut r = record(i, &format!("City {}", i), "India", 4.0);
            r.primary_cuisine = format!("Cuisine {}", i);
            records.push(r);
        }
        let summary = city_unique_cuisines(&records).unwrap();
        assert_eq!(summary.len(), 10);
        assert_eq!(summary.metric_label, "Number Of Unique Cuisines");
    }

    #[test]
    fn test_cuisine_mean_labels_the_aggregated_metric() {
        let records = vec![record(1, "A", "India", 4.0)];
        let summary = cuisine_mean(&records, Column::PriceRange, SortOrder::Descending).unwrap();
        assert_eq!(summary.metric_label, "Mean Price Range");
        assert_eq!(summary.key_labels, vec!["Cuisines "]);
    }

    #[test]
    fn test_top_rated_is_stable_and_clamped() {
        let records = vec![
            record(1, "A", "India", 4.5),
            record(2, "A", "India", 4.9),
            record(3, "A", "India", 4.5),
        ];
        let top = top_rated(&records, 10);
        let ids: Vec<i64> = top.iter().map(|r| r.restaurant_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(top_rated(&records, 0).len(), 0);
    }

    #[test]
    fn test_highlights_cap_at_five_slots() {
        let records: Vec<_> = (0..8).map(|i| record(i, "A", "India", 4.0)).collect();
        assert_eq!(highlights(&records, 8).len(), 5);
        assert_eq!(highlights(&records, 3).len(), 3);
        assert!(highlights(&records[..0], 5).is_empty());

        let card = &highlights(&records, 1)[0];
        assert_eq!(card.label, "Italian: Restaurant 0");
        assert_eq!(card.value, "4.0/5.0");
        assert_eq!(card.price_scale, "2/4");
    }

    #[test]
    fn test_highlight_shows_stored_rating() {
        let records = vec![record(1, "A", "India", 4.25), record(2, "A", "India", 3.0)];
        let cards = highlights(&records, 2);
        assert_eq!(cards[0].value, "4.25/5.0");
        assert_eq!(cards[1].value, "3.0/5.0");
    }

    #[test]
    fn test_top_restaurants_keeps_unrounded_mean() {
        let mut records = vec![record(1, "A", "India", 4.25), record(2, "A", "India", 4.9)];
        records[1].votes = 99;
        let summary = top_restaurants(&records, 1).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.rows[0].key[0], "Restaurant 2");
        assert_eq!(summary.rows[0].key[5], "99");

        let summary = top_restaurants(&records, 5).unwrap();
        assert_eq!(summary.rows[1].value, 4.25);
    }

    #[test]
    fn test_overview_counts() {
        let mut records = vec![
            record(1, "Rio", "Brazil", 4.0),
            record(2, "Rio", "Brazil", 3.0),
            record(3, "Pune", "India", 3.0),
        ];
        records[2].primary_cuisine = "North Indian".to_string();
        let summary = overview(&records);
        assert_eq!(
            summary,
            Overview {
                restaurants: 3,
                countries: 2,
                cities: 2,
                votes: 30,
                cuisines: 2,
            }
        );
    }

    #[test]
    fn test_map_marker_popup_fields() {
        let records = vec![record(1, "Rio", "Brazil", 4.0)];
        let marker = &map_markers(&records)[0];
        assert_eq!(marker.price, "100,00 (Indian Rupees(Rs.)) for two");
        assert_eq!(marker.color, "green");
    }
}
