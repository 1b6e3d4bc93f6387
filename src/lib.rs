//! Bizdeck - Collection views and optimistic mutations for business card clients
//!
//! This library keeps fetched entity collections in memory, derives sorted
//! and paginated views over them, ranks them with fuzzy search, and applies
//! user actions (favorite, delete, create, update) to the remote service and
//! the local caches in one step.

use thiserror::Error;

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod model;
pub mod notify;
pub mod search;
pub mod session;
pub mod store;
pub mod transport;
pub mod view;

#[cfg(test)]
pub mod testing;

pub use cache::{EntityCache, FetchError};
pub use config::EngineConfig;
pub use coordinator::{MutationCoordinator, MutationError, MutationOutcome, MutationState};
pub use model::{Card, Entity, EntityKind, Snapshot, User};
pub use session::{BearerToken, Session, SessionUser};
pub use view::{SortMode, ViewParams, ViewState};

/// Error enum, contains all failure states of the engine
#[derive(Debug, Error)]
pub enum BizdeckError {
    /// Fetching a collection failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// A mutation was rolled back
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),
    /// Search options were rejected
    #[error("Index error: {0}")]
    IndexBuild(#[from] search::IndexBuildError),
    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),
    /// Snapshot hand-off storage failed
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("Transport error: {0}")]
    Transport(#[from] transport::TransportError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
