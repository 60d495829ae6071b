//! Canonical column naming for the raw extract.

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex"));
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));

/// Splits camel humps with underscores, turns dashes into underscores and lowercases.
fn underscore(word: &str) -> String {
    let word = ACRONYM_BOUNDARY.replace_all(word, "${1}_${2}");
    let word = CAMEL_BOUNDARY.replace_all(&word, "${1}_${2}");
    word.replace('-', "_").to_lowercase()
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Canonical snake_case name for a raw column label.
///
/// The label is title-cased word by word, the spaces are stripped and the resulting
/// camel-case word is converted back to snake_case, so `"Average Cost for two"` becomes
/// `average_cost_for_two` and `"Restaurant ID"` becomes `restaurant_id`. The output is a
/// fixed point: canonicalizing a canonical name returns it unchanged.
pub fn canonical_column_name(label: &str) -> String {
    let titled: String = underscore(label.trim())
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(title_word)
        .collect();
    underscore(&titled)
}

pub fn rename_columns<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    labels.into_iter().map(canonical_column_name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headers_are_canonicalized() {
        let headers = [
            "Restaurant ID",
            "Restaurant Name",
            "Country Code",
            "City",
            "Cuisines",
            "Average Cost for two",
            "Currency",
            "Has Table booking",
            "Has Online delivery",
            "Is delivering now",
            "Aggregate rating",
            "Rating color",
            "Votes",
            "Price range",
            "Latitude",
            "Longitude",
        ];
        assert_eq!(
            rename_columns(headers),
            vec![
                "restaurant_id",
                "restaurant_name",
                "country_code",
                "city",
                "cuisines",
                "average_cost_for_two",
                "currency",
                "has_table_booking",
                "has_online_delivery",
                "is_delivering_now",
                "aggregate_rating",
                "rating_color",
                "votes",
                "price_range",
                "latitude",
                "longitude",
            ]
        );
    }

    #[test]
    fn test_inconsistent_spacing_and_casing() {
        assert_eq!(canonical_column_name("  restaurant   id "), "restaurant_id");
        assert_eq!(canonical_column_name("RESTAURANT ID"), "restaurant_id");
        assert_eq!(canonical_column_name("RestaurantID"), "restaurant_id");
        assert_eq!(canonical_column_name("price-range"), "price_range");
        assert_eq!(canonical_column_name("Switch to order menu"), "switch_to_order_menu");
    }

    #[test]
    fn test_renaming_twice_is_a_no_op() {
        for label in ["Restaurant ID", "Average Cost for two", "Locality Verbose", "Votes"] {
            let once = canonical_column_name(label);
            assert_eq!(canonical_column_name(&once), once);
        }
    }

    #[test]
    fn test_empty_label() {
        assert_eq!(canonical_column_name(""), "");
        assert_eq!(canonical_column_name("   "), "");
    }
}
