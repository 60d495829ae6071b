//! Aggregation layer: pure group/aggregate/rank/truncate queries over the normalized table.

pub mod filters;
pub mod label;
pub mod queries;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{InsightsError, Result};
use crate::types::{Column, NormalizedRecord};

pub use filters::{RatingThreshold, Selection};
pub use label::display_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// How each group is reduced to a single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Number of distinct values of a column
    DistinctCount(Column),
    /// Arithmetic mean of a numeric column
    Mean(Column),
    /// Number of rows
    Count,
}

impl Aggregation {
    fn default_name(self) -> String {
        match self {
            Aggregation::DistinctCount(column) => format!("number_of_{}", column),
            Aggregation::Mean(column) => format!("mean_{}", column),
            Aggregation::Count => "count".to_string(),
        }
    }
}

/// Parameters of one grouped summary.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub group_by: Vec<Column>,
    pub aggregation: Aggregation,
    pub order: SortOrder,
    pub limit: Option<usize>,
    /// Internal metric name, shown to users through [`display_label`]
    pub metric: String,
    /// Decimal places kept in the reported value; ranking always uses the exact value
    pub decimals: Option<i32>,
}

impl AggregateQuery {
    /// Descending, untruncated; means are reported to one decimal place.
    pub fn new(group_by: &[Column], aggregation: Aggregation) -> Self {
        Self {
            group_by: group_by.to_vec(),
            aggregation,
            order: SortOrder::Descending,
            limit: None,
            metric: aggregation.default_name(),
            decimals: matches!(aggregation, Aggregation::Mean(_)).then_some(1),
        }
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn named(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn decimals(mut self, decimals: Option<i32>) -> Self {
        self.decimals = decimals;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// 1-based position after sorting
    pub rank: usize,
    /// Group key values, in `Summary::keys` order
    pub key: Vec<String>,
    pub value: f64,
}

/// Ranked output of one aggregation, with everything a chart needs to label itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub keys: Vec<Column>,
    pub key_labels: Vec<String>,
    pub metric: String,
    pub metric_label: String,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value for the group whose key starts with `first_key`, if present.
    pub fn value_of(&self, first_key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.first().map(String::as_str) == Some(first_key))
            .map(|r| r.value)
    }
}

struct Group {
    key: Vec<String>,
    rows: usize,
    sum: f64,
    distinct: HashSet<String>,
}

/// Round half to even, the way numpy rounds for display.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Groups, aggregates, sorts and truncates in one pass over `records`.
///
/// Groups are enumerated in order of first appearance and sorted stably, so ties keep that
/// order in either direction. A limit larger than the number of groups returns every group;
/// an empty input returns an empty summary.
pub fn aggregate<'a, I>(records: I, query: &AggregateQuery) -> Result<Summary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    if let Aggregation::Mean(column) = query.aggregation {
        if !column.is_numeric() {
            return Err(InsightsError::NotNumeric(column));
        }
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();

    for record in records {
        let key: Vec<String> = query.group_by.iter().map(|c| record.text(*c)).collect();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    rows: 0,
                    sum: 0.0,
                    distinct: HashSet::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[slot];
        group.rows += 1;
        match query.aggregation {
            Aggregation::Mean(column) => group.sum += record.number(column).unwrap_or_default(),
            Aggregation::DistinctCount(column) => {
                group.distinct.insert(record.text(column));
            }
            Aggregation::Count => {}
        }
    }

    let mut ranked: Vec<(Vec<String>, f64)> = groups
        .into_iter()
        .map(|g| {
            let value = match query.aggregation {
                Aggregation::Mean(_) => g.sum / g.rows as f64,
                Aggregation::DistinctCount(_) => g.distinct.len() as f64,
                Aggregation::Count => g.rows as f64,
            };
            (g.key, value)
        })
        .collect();

    match query.order {
        SortOrder::Ascending => ranked.sort_by(|a, b| a.1.total_cmp(&b.1)),
        SortOrder::Descending => ranked.sort_by(|a, b| b.1.total_cmp(&a.1)),
    }
    if let Some(limit) = query.limit {
        ranked.truncate(limit);
    }

    let rows = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (key, value))| SummaryRow {
            rank: i + 1,
            key,
            value: query.decimals.map_or(value, |d| round_to(value, d)),
        })
        .collect();

    Ok(Summary {
        keys: query.group_by.clone(),
        key_labels: query.group_by.iter().map(|c| display_label(c.name())).collect(),
        metric: query.metric.clone(),
        metric_label: display_label(&query.metric),
        rows,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_mean_by_group_is_rounded_for_display_only() {
        let records = vec![
            record(1, "A", "India", 3.0),
            record(2, "B", "India", 4.0),
            record(3, "A", "India", 3.5),
        ];
        let query = AggregateQuery::new(&[Column::City], Aggregation::Mean(Column::AggregateRating));
        let summary = aggregate(&records, &query).unwrap();
        assert_eq!(summary.rows[0].key, vec!["B"]);
        assert_eq!(summary.rows[0].value, 4.0);
        // 3.25 rounds half to even
        assert_eq!(summary.rows[1].key, vec!["A"]);
        assert_eq!(summary.rows[1].value, 3.2);
        assert_eq!(summary.metric, "mean_aggregate_rating");
        assert_eq!(summary.metric_label, "Mean Aggregate Rating");
    }

    #[test]
    fn test_ties_keep_first_appearance_in_both_directions() {
        let records = vec![
            record(1, "Zeta", "India", 4.0),
            record(2, "Alpha", "India", 4.0),
            record(3, "Mid", "India", 2.0),
        ];
        let query = AggregateQuery::new(&[Column::City], Aggregation::Count);
        let desc = aggregate(&records, &query).unwrap();
        let keys: Vec<&str> = desc.rows.iter().map(|r| r.key[0].as_str()).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);

        let asc = aggregate(&records, &query.clone().order(SortOrder::Ascending)).unwrap();
        let keys: Vec<&str> = asc.rows.iter().map(|r| r.key[0].as_str()).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(asc.rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_limit_is_clamped_to_group_count() {
        let records = vec![record(1, "A", "India", 4.0), record(2, "B", "India", 3.0)];
        let query = AggregateQuery::new(&[Column::City], Aggregation::Count).limit(50);
        assert_eq!(aggregate(&records, &query).unwrap().len(), 2);
    }

    #[test]
    fn test_composite_key_separates_same_city_in_two_countries() {
        let records = vec![
            record(1, "Victoria", "Canada", 4.0),
            record(2, "Victoria", "Australia", 3.0),
            record(3, "Victoria", "Canada", 2.0),
        ];
        let query = AggregateQuery::new(&[Column::City, Column::Country], Aggregation::Count);
        let summary = aggregate(&records, &query).unwrap();
        assert_eq!(summary.rows[0].key, vec!["Victoria", "Canada"]);
        assert_eq!(summary.rows[0].value, 2.0);
        assert_eq!(summary.rows[1].key, vec!["Victoria", "Australia"]);
        assert_eq!(summary.key_labels, vec!["City", "Country"]);
    }

    #[test]
    fn test_distinct_count() {
        let mut records = vec![
            record(1, "A", "India", 4.0),
            record(2, "A", "India", 3.0),
            record(3, "B", "India", 3.0),
        ];
        records[1].primary_cuisine = "Chinese".to_string();
        let query = AggregateQuery::new(
            &[Column::Country],
            Aggregation::DistinctCount(Column::PrimaryCuisine),
        );
        let summary = aggregate(&records, &query).unwrap();
        assert_eq!(summary.value_of("India"), Some(2.0));
        assert_eq!(summary.metric, "number_of_cuisines_");
    }

    #[test]
    fn test_empty_input_yields_empty_summary() {
        let records: Vec<NormalizedRecord> = Vec::new();
        let query = AggregateQuery::new(&[Column::Country], Aggregation::Count).limit(7);
        let summary = aggregate(&records, &query).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.metric_label, "Count");
    }

    #[test]
    fn test_mean_of_text_column_is_rejected() {
        let records = vec![record(1, "A", "India", 4.0)];
        let query = AggregateQuery::new(&[Column::Country], Aggregation::Mean(Column::City));
        assert!(matches!(
            aggregate(&records, &query),
            Err(InsightsError::NotNumeric(Column::City))
        ));
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to(4.0, 1), 4.0);
        assert_eq!(round_to(3.25, 1), 3.2);
        assert_eq!(round_to(2.04, 1), 2.0);
    }
}
