//! Fuzzy index over one snapshot
//!
//! Each entity contributes the text of its configured key paths. A query
//! matches a field when an approximate occurrence of it exists anywhere in
//! the field; the field score is
//!
//! ```text
//! errors / query_len + start / distance
//! ```
//!
//! where `errors` is the edit distance of the best occurrence and `start`
//! its offset. The entity score is its best field score, and the entity
//! matches when that score is at most the threshold.
//!
//! Results are ranked by exact whole-field match, then score, then the
//! nucleo subsequence score of the best field, then original position.

use super::error::{IndexBuildError, SearchError};
use crate::model::{Entity, Snapshot};
use nucleo::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use rayon::prelude::*;
use std::marker::PhantomData;

/// Default match threshold
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Default offset over which the location penalty reaches 1.0
pub const DEFAULT_DISTANCE: usize = 100;

/// Which fields to index and how strictly to match
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    keys: Vec<String>,
    threshold: f64,
    distance: usize,
    ignore_location: bool,
}

impl SearchOptions {
    /// Options over `keys` with default threshold and distance
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            threshold: DEFAULT_THRESHOLD,
            distance: DEFAULT_DISTANCE,
            ignore_location: false,
        }
    }

    /// Options over the default keys of `E`
    #[must_use]
    pub fn for_entity<E: Entity>() -> Self {
        Self::new(E::default_search_keys().iter().copied())
    }

    /// 0.0 requires an exact match, 1.0 matches anything
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_distance(mut self, distance: usize) -> Self {
        self.distance = distance;
        self
    }

    /// Score occurrences the same wherever they start in the field
    #[must_use]
    pub const fn ignore_location(mut self, ignore: bool) -> Self {
        self.ignore_location = ignore;
        self
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn distance(&self) -> usize {
        self.distance
    }

    #[must_use]
    pub const fn ignores_location(&self) -> bool {
        self.ignore_location
    }

    /// Check the options against the key paths `E` can resolve
    ///
    /// # Errors
    ///
    /// Returns `IndexBuildError` for an empty key set, an unknown key or a
    /// threshold outside `0.0..=1.0`.
    pub fn validate<E: Entity>(&self) -> Result<(), IndexBuildError> {
        if self.keys.is_empty() {
            return Err(IndexBuildError::EmptyKeys);
        }

        if let Some(key) = self.keys.iter().find(|key| !E::supports_key(key)) {
            return Err(IndexBuildError::UnknownKey {
                kind: E::KIND,
                key: key.clone(),
            });
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(IndexBuildError::InvalidThreshold(self.threshold));
        }

        Ok(())
    }

    fn location_penalty(&self, start: usize) -> f64 {
        if self.ignore_location || start == 0 {
            return 0.0;
        }
        if self.distance == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let penalty = start as f64 / self.distance as f64;
        penalty
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

struct IndexedField {
    text: String,
    folded: Vec<char>,
}

struct Hit {
    position: usize,
    exact: bool,
    score: f64,
    fuzzy: u32,
}

/// Searchable index built over one snapshot
pub struct FuzzyIndex<E> {
    revision: Option<u64>,
    options: SearchOptions,
    records: Vec<Vec<IndexedField>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> FuzzyIndex<E> {
    /// Index `snapshot`, remembering its revision
    ///
    /// # Errors
    ///
    /// Returns `IndexBuildError` if the options are invalid for `E`.
    pub fn build(snapshot: &Snapshot<E>, options: SearchOptions) -> Result<Self, IndexBuildError> {
        let mut index = Self::build_unversioned(snapshot.entities(), options)?;
        index.revision = Some(snapshot.revision());
        Ok(index)
    }

    /// Index a bare entity list; queries must pass the same list
    pub(crate) fn build_unversioned(entities: &[E], options: SearchOptions) -> Result<Self, IndexBuildError> {
        options.validate::<E>()?;

        let records = entities
            .par_iter()
            .map(|entity| {
                options
                    .keys
                    .iter()
                    .filter_map(|key| entity.search_value(key))
                    .map(|text| IndexedField {
                        folded: text.to_lowercase().chars().collect(),
                        text,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Self {
            revision: None,
            options,
            records,
            _marker: PhantomData,
        })
    }

    /// Revision of the snapshot this index was built from
    #[must_use]
    pub const fn revision(&self) -> Option<u64> {
        self.revision
    }

    #[must_use]
    pub const fn options(&self) -> &SearchOptions {
        &self.options
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entities of `snapshot` matching `query`, best first
    ///
    /// A blank query returns every entity in original order.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::StaleIndex` if `snapshot` is not the one this
    /// index was built from.
    pub fn search(&self, snapshot: &Snapshot<E>, query: &str) -> Result<Vec<E>, SearchError> {
        if self.revision != Some(snapshot.revision()) {
            return Err(SearchError::StaleIndex {
                index: self.revision.unwrap_or_default(),
                snapshot: snapshot.revision(),
            });
        }
        Ok(pick(snapshot.entities(), &self.rank(query)))
    }

    /// Positions of matching entities, best first
    pub(crate) fn rank(&self, query: &str) -> Vec<usize> {
        let query = query.trim();
        if query.is_empty() {
            return (0..self.records.len()).collect();
        }

        let folded: Vec<char> = query.to_lowercase().chars().collect();
        let pattern = Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);

        let mut hits: Vec<Hit> = self
            .records
            .par_iter()
            .enumerate()
            .map_init(
                || (Matcher::new(Config::DEFAULT), Vec::new()),
                |(matcher, buf), (position, fields)| {
                    self.score_record(position, fields, &folded, &pattern, matcher, buf)
                },
            )
            .collect::<Vec<Option<Hit>>>()
            .into_iter()
            .flatten()
            .collect();

        hits.sort_by(|a, b| {
            b.exact
                .cmp(&a.exact)
                .then_with(|| a.score.total_cmp(&b.score))
                .then_with(|| b.fuzzy.cmp(&a.fuzzy))
                .then_with(|| a.position.cmp(&b.position))
        });

        hits.into_iter().map(|hit| hit.position).collect()
    }

    fn score_record(
        &self,
        position: usize,
        fields: &[IndexedField],
        query: &[char],
        pattern: &Pattern,
        matcher: &mut Matcher,
        buf: &mut Vec<char>,
    ) -> Option<Hit> {
        let (best, exact, score) = fields
            .iter()
            .map(|field| {
                let exact = field.folded == query;
                let score = if exact {
                    0.0
                } else {
                    let (errors, start) = best_occurrence(query, &field.folded);
                    #[allow(clippy::cast_precision_loss)]
                    let accuracy = errors as f64 / query.len() as f64;
                    accuracy + self.options.location_penalty(start)
                };
                (field, exact, score)
            })
            .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.total_cmp(&b.2)))?;

        if !exact && score > self.options.threshold {
            return None;
        }

        let fuzzy = pattern
            .score(Utf32Str::new(&best.text, buf), matcher)
            .unwrap_or(0);

        Some(Hit {
            position,
            exact,
            score,
            fuzzy,
        })
    }
}

fn pick<E: Clone>(entities: &[E], positions: &[usize]) -> Vec<E> {
    positions
        .iter()
        .filter_map(|&pos| entities.get(pos).cloned())
        .collect()
}

pub(crate) fn pick_ranked<E: Entity>(index: &FuzzyIndex<E>, entities: &[E], query: &str) -> Vec<E> {
    pick(entities, &index.rank(query))
}

/// Edit errors and start offset of the best approximate occurrence of
/// `pattern` inside `text`
///
/// Semi-global Levenshtein: the occurrence may start and end anywhere in
/// `text` for free. Ties on errors prefer the earliest start.
fn best_occurrence(pattern: &[char], text: &[char]) -> (usize, usize) {
    let n = text.len();

    // Row 0: an empty prefix of the pattern matches at every offset.
    let mut prev: Vec<usize> = vec![0; n + 1];
    let mut prev_start: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];
    let mut curr_start: Vec<usize> = vec![0; n + 1];

    for (i, p) in pattern.iter().enumerate() {
        curr[0] = i + 1;
        curr_start[0] = 0;
        for (j, t) in text.iter().enumerate() {
            let cost = usize::from(p != t);
            let candidates = [
                (prev[j] + cost, prev_start[j]),
                (prev[j + 1] + 1, prev_start[j + 1]),
                (curr[j] + 1, curr_start[j]),
            ];
            let (errors, start) = candidates
                .into_iter()
                .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
                .unwrap_or((usize::MAX, 0));
            curr[j + 1] = errors;
            curr_start[j + 1] = start;
        }
        std::mem::swap(&mut prev, &mut curr);
        std::mem::swap(&mut prev_start, &mut curr_start);
    }

    prev.iter()
        .zip(prev_start.iter())
        .map(|(&errors, &start)| (errors, start))
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
        .unwrap_or((pattern.len(), 0))
}

impl<E> std::fmt::Debug for FuzzyIndex<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyIndex")
            .field("revision", &self.revision)
            .field("options", &self.options)
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Card, User};
    use crate::testing::{business, ids, user};

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn directory() -> Snapshot<Card> {
        Snapshot::new(vec![
            business("c1", "Pizzeria Napoli", "Haifa", "Wood oven pizza"),
            business("c2", "Pizza", "Tel Aviv", "Slices"),
            business("c3", "Best coffee and cafe", "Eilat", "Beans"),
            business("c4", "Cafe Roma", "Haifa", "Espresso bar"),
            business("c5", "Pizza Place", "Jerusalem", "Family pizza"),
        ])
    }

    fn title_only() -> SearchOptions {
        SearchOptions::new(["title"])
    }

    #[test]
    fn test_best_occurrence_exact_substring() {
        assert_eq!(best_occurrence(&chars("roma"), &chars("cafe roma")), (0, 5));
        assert_eq!(best_occurrence(&chars("cafe"), &chars("cafe roma")), (0, 0));
    }

    #[test]
    fn test_best_occurrence_with_typo() {
        let (errors, start) = best_occurrence(&chars("piza"), &chars("pizza place"));
        assert_eq!(errors, 1);
        assert_eq!(start, 0);
    }

    #[test]
    fn test_best_occurrence_no_overlap() {
        let (errors, _) = best_occurrence(&chars("xyz"), &chars("abc"));
        assert_eq!(errors, 3);
    }

    #[test]
    fn test_exact_title_ranks_first() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        let results = index.search(&snapshot, "Pizza").unwrap();

        assert_eq!(ids(&results)[0], "c2");
        assert!(ids(&results).contains(&"c5".to_string()));
    }

    #[test]
    fn test_case_insensitive() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "CAFE ROMA").unwrap()), vec!["c4"]);
    }

    #[test]
    fn test_typo_still_matches() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        let results = ids(&index.search(&snapshot, "piza").unwrap());
        assert!(results.contains(&"c2".to_string()));
        assert!(results.contains(&"c5".to_string()));
    }

    #[test]
    fn test_location_penalty_orders_results() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "cafe").unwrap()), vec!["c4", "c3"]);
    }

    #[test]
    fn test_ignore_location_falls_back_to_position() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only().ignore_location(true)).unwrap();
        let results = ids(&index.search(&snapshot, "cafe").unwrap());
        assert_eq!(results.len(), 2);
        assert!(results.contains(&"c3".to_string()));
    }

    #[test]
    fn test_zero_threshold_requires_exact_leading_match() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only().with_threshold(0.0)).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "cafe").unwrap()), vec!["c4"]);
    }

    #[test]
    fn test_any_configured_key_matches() {
        let snapshot = directory();
        let options = SearchOptions::new(["title", "address.city"]);
        let index = FuzzyIndex::build(&snapshot, options).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "haifa").unwrap()), vec!["c1", "c4"]);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let snapshot = Snapshot::new(vec![Card::new("empty", ""), Card::new("full", "Bakery")]);
        let index = FuzzyIndex::build(&snapshot, SearchOptions::for_entity::<Card>()).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "bakery").unwrap()), vec!["full"]);
    }

    #[test]
    fn test_blank_query_returns_everything_in_order() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        assert_eq!(index.search(&snapshot, "   ").unwrap(), snapshot.entities());
    }

    #[test]
    fn test_no_match() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        assert!(index.search(&snapshot, "qqqqqqqq").unwrap().is_empty());
    }

    #[test]
    fn test_stale_index_rejected() {
        let snapshot = directory();
        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        let changed = directory();

        let err = index.search(&changed, "pizza").unwrap_err();
        assert!(matches!(err, SearchError::StaleIndex { .. }));
    }

    #[test]
    fn test_users_by_name() {
        let snapshot = Snapshot::new(vec![user("u1", "Dana", "Levi"), user("u2", "Avi", "Cohen")]);
        let index = FuzzyIndex::build(&snapshot, SearchOptions::for_entity::<User>()).unwrap();
        assert_eq!(ids(&index.search(&snapshot, "cohen").unwrap()), vec!["u2"]);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            SearchOptions::new(["title", "color"]).validate::<Card>(),
            Err(IndexBuildError::UnknownKey {
                kind: crate::model::EntityKind::Card,
                key: "color".into()
            })
        );
        assert_eq!(
            SearchOptions::default().validate::<Card>(),
            Err(IndexBuildError::EmptyKeys)
        );
        assert_eq!(
            title_only().with_threshold(1.5).validate::<Card>(),
            Err(IndexBuildError::InvalidThreshold(1.5))
        );
        assert!(title_only().with_threshold(f64::NAN).validate::<Card>().is_err());
        assert!(SearchOptions::for_entity::<User>().validate::<User>().is_ok());
    }

    #[test]
    fn test_large_snapshot() {
        let mut cards: Vec<Card> = (0..2000)
            .map(|i| business(&format!("c{i}"), &format!("Shop {i}"), "Haifa", ""))
            .collect();
        cards.push(business("needle", "Unique Bookbinder", "Acre", ""));
        let snapshot = Snapshot::new(cards);

        let index = FuzzyIndex::build(&snapshot, title_only()).unwrap();
        assert_eq!(index.len(), 2001);
        assert_eq!(ids(&index.search(&snapshot, "bookbinder").unwrap()), vec!["needle"]);
    }
}
