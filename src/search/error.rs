//! Search-specific error types
//!
//! Neither error is shown to the user. Screens fall back to the unfiltered
//! listing (see [`search_or_unfiltered`](super::search_or_unfiltered)).
//!
//! # Error Types
//!
//! - **`IndexBuildError`**: The index options are unusable (unknown key
//!   path, no keys, threshold out of range)
//! - **`SearchError`**: A built index was queried against a snapshot it was
//!   not built from, or could not be built at all

use crate::model::EntityKind;
use thiserror::Error;

/// An index could not be built from the given options
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexBuildError {
    /// A key path that the entity type cannot resolve
    #[error("Unknown search key '{key}' for {}s", kind.label())]
    UnknownKey { kind: EntityKind, key: String },

    #[error("No search keys configured")]
    EmptyKeys,

    /// Threshold outside `0.0..=1.0`
    #[error("Search threshold {0} is out of range (expected 0.0 to 1.0)")]
    InvalidThreshold(f64),
}

/// A query could not be answered
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The index was built over a different snapshot revision
    #[error("Search index is stale (built for revision {index}, queried with {snapshot})")]
    StaleIndex { index: u64, snapshot: u64 },

    #[error("Failed to build search index: {0}")]
    Build(#[from] IndexBuildError),
}
