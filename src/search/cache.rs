//! Cache of built search indices
//!
//! Indices are keyed by snapshot revision plus the options they were built
//! with. A changed snapshot has a new revision, so it never hits an index
//! built over older data.

use super::error::{IndexBuildError, SearchError};
use super::index::{FuzzyIndex, SearchOptions};
use crate::model::{Entity, Snapshot};
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    revision: u64,
    keys: Vec<String>,
    threshold: u64,
    distance: usize,
    ignore_location: bool,
}

impl IndexKey {
    fn new(revision: u64, options: &SearchOptions) -> Self {
        Self {
            revision,
            keys: options.keys().to_vec(),
            threshold: options.threshold().to_bits(),
            distance: options.distance(),
            ignore_location: options.ignores_location(),
        }
    }
}

/// Built indices for one entity type
pub struct IndexCache<E: Entity> {
    cache: Cache<IndexKey, Arc<FuzzyIndex<E>>>,
}

impl<E: Entity> IndexCache<E> {
    /// Create a cache holding up to 16 indices for 10 minutes
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache_config(Duration::from_secs(600), 16)
    }

    /// Create a cache with custom expiry and capacity
    #[must_use]
    pub fn with_cache_config(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { cache }
    }

    /// Index for `snapshot`, building it on a miss
    ///
    /// # Errors
    ///
    /// Returns `IndexBuildError` if the options are invalid for `E`.
    pub fn get_or_build(
        &self,
        snapshot: &Snapshot<E>,
        options: &SearchOptions,
    ) -> Result<Arc<FuzzyIndex<E>>, IndexBuildError> {
        let key = IndexKey::new(snapshot.revision(), options);
        self.cache
            .try_get_with(key, || {
                tracing::debug!(
                    kind = E::KIND.label(),
                    revision = snapshot.revision(),
                    count = snapshot.len(),
                    "building search index"
                );
                FuzzyIndex::build(snapshot, options.clone()).map(Arc::new)
            })
            .map_err(|err| (*err).clone())
    }

    /// Entities of `snapshot` matching `query`, best first
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the index cannot be built.
    pub fn search(&self, snapshot: &Snapshot<E>, query: &str, options: &SearchOptions) -> Result<Vec<E>, SearchError> {
        if query.trim().is_empty() {
            return Ok(snapshot.entities().to_vec());
        }
        let index = self.get_or_build(snapshot, options)?;
        index.search(snapshot, query)
    }

    /// Like [`search`](Self::search), falling back to the whole snapshot
    #[must_use]
    pub fn search_or_unfiltered(&self, snapshot: &Snapshot<E>, query: &str, options: &SearchOptions) -> Vec<E> {
        self.search(snapshot, query, options).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "search unavailable, showing unfiltered list");
            snapshot.entities().to_vec()
        })
    }

    /// Drop every cached index
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Number of cached indices
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Entity> Default for IndexCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;
    use crate::testing::{business, ids};

    fn snapshot() -> Snapshot<Card> {
        Snapshot::new(vec![
            business("c1", "Falafel Stand", "Haifa", ""),
            business("c2", "Hummus Bar", "Akko", ""),
        ])
    }

    #[test]
    fn test_same_revision_reuses_index() {
        let cache = IndexCache::new();
        let snapshot = snapshot();
        let options = SearchOptions::for_entity::<Card>();

        let first = cache.get_or_build(&snapshot, &options).unwrap();
        let second = cache.get_or_build(&snapshot, &options).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_new_revision_rebuilds() {
        let cache = IndexCache::new();
        let options = SearchOptions::for_entity::<Card>();
        let mut snapshot = snapshot();

        let before = cache.get_or_build(&snapshot, &options).unwrap();
        snapshot.remove("c1");
        let after = cache.get_or_build(&snapshot, &options).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.revision(), Some(snapshot.revision()));
        assert_eq!(ids(&cache.search(&snapshot, "falafel", &options).unwrap()), Vec::<String>::new());
    }

    #[test]
    fn test_different_options_build_separately() {
        let cache = IndexCache::new();
        let snapshot = snapshot();

        cache.get_or_build(&snapshot, &SearchOptions::new(["title"])).unwrap();
        cache
            .get_or_build(&snapshot, &SearchOptions::new(["title"]).with_threshold(0.1))
            .unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_search_and_fallback() {
        let cache = IndexCache::new();
        let snapshot = snapshot();

        let found = cache
            .search(&snapshot, "hummus", &SearchOptions::for_entity::<Card>())
            .unwrap();
        assert_eq!(ids(&found), vec!["c2"]);

        let broken = SearchOptions::new(["nope"]);
        assert!(cache.search(&snapshot, "hummus", &broken).is_err());
        assert_eq!(cache.search_or_unfiltered(&snapshot, "hummus", &broken).len(), 2);
    }

    #[test]
    fn test_build_error_is_not_cached() {
        let cache = IndexCache::<Card>::new();
        let err = cache
            .get_or_build(&snapshot(), &SearchOptions::default())
            .unwrap_err();
        assert_eq!(err, IndexBuildError::EmptyKeys);
        assert!(cache.is_empty());
    }
}
