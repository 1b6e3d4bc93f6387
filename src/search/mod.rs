//! Fuzzy search over collection snapshots
//!
//! [`search`] answers one-off queries over a bare entity list. Screens that
//! re-run queries against the same snapshot go through [`IndexCache`],
//! which keeps built [`FuzzyIndex`]es keyed by snapshot revision.
//!
//! Search failures are never shown to the user: [`search_or_unfiltered`]
//! logs the error and returns the input unchanged.

pub mod cache;
pub mod error;
pub mod index;

pub use cache::IndexCache;
pub use error::{IndexBuildError, SearchError};
pub use index::{DEFAULT_DISTANCE, DEFAULT_THRESHOLD, FuzzyIndex, SearchOptions};

use crate::model::Entity;

/// Entities approximately matching `query` on any of `keys`, best first
///
/// A blank query returns `entities` unchanged, in original order.
///
/// # Errors
///
/// Returns `IndexBuildError` if `keys` is empty or names an unknown key
/// path, or if `threshold` is outside `0.0..=1.0`.
pub fn search<E: Entity>(query: &str, entities: &[E], keys: &[&str], threshold: f64) -> Result<Vec<E>, IndexBuildError> {
    if query.trim().is_empty() {
        return Ok(entities.to_vec());
    }

    let options = SearchOptions::new(keys.iter().copied()).with_threshold(threshold);
    let index = FuzzyIndex::build_unversioned(entities, options)?;
    Ok(index::pick_ranked(&index, entities, query))
}

/// Like [`search`], but degrades to the unfiltered list on error
#[must_use]
pub fn search_or_unfiltered<E: Entity>(query: &str, entities: &[E], keys: &[&str], threshold: f64) -> Vec<E> {
    search(query, entities, keys, threshold).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "search unavailable, showing unfiltered list");
        entities.to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;
    use crate::testing::{business, cards, ids};

    #[test]
    fn test_empty_query_returns_input() {
        let entities = cards(5);
        assert_eq!(search("", &entities, &["title"], 0.3).unwrap(), entities);
        assert_eq!(search(" \t ", &entities, &["title"], 0.3).unwrap(), entities);
    }

    #[test]
    fn test_exact_title_near_top() {
        let entities = vec![
            business("a", "Sunrise Yoga Studio", "Haifa", ""),
            business("b", "Sunset Surf School", "Tel Aviv", ""),
            business("c", "Sunrise", "Eilat", ""),
        ];
        let results = search("Sunrise", &entities, Card::default_search_keys(), 0.3).unwrap();
        assert_eq!(ids(&results)[0], "c");
        assert!(ids(&results).contains(&"a".to_string()));
    }

    #[test]
    fn test_invalid_options_degrade() {
        let entities = cards(3);

        assert!(matches!(
            search("card", &entities, &["nope"], 0.3),
            Err(IndexBuildError::UnknownKey { .. })
        ));
        assert!(matches!(search("card", &entities, &[], 0.3), Err(IndexBuildError::EmptyKeys)));
        assert!(matches!(
            search("card", &entities, &["title"], -0.1),
            Err(IndexBuildError::InvalidThreshold(_))
        ));

        assert_eq!(search_or_unfiltered("card", &entities, &["nope"], 0.3), entities);
    }

    #[test]
    fn test_numbers_are_searchable() {
        let mut card = Card::new("biz", "Locksmith");
        card.biz_number = Some(8_812_345);
        let entities = vec![Card::new("other", "Florist"), card];

        let results = search("8812345", &entities, &["bizNumber"], 0.0).unwrap();
        assert_eq!(ids(&results), vec!["biz"]);
    }
}
