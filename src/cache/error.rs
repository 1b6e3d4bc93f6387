//! Snapshot load errors
//!
//! Policy: the screen shows its empty state, nothing retries on its own,
//! and the user can trigger a refresh.

use crate::transport::TransportError;
use thiserror::Error;

/// A snapshot could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport call failed
    #[error("Failed to fetch {kind}s: {source}")]
    Transport {
        kind: &'static str,
        source: TransportError,
    },

    /// The collection requires a signed-in user and the session has none
    #[error("Not signed in")]
    NotAuthenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Transport {
            kind: "card",
            source: TransportError::Network("offline".into()),
        };
        assert_eq!(err.to_string(), "Failed to fetch cards: Network error: offline");
    }

    #[test]
    fn test_fetch_error_source() {
        use std::error::Error as _;
        let err = FetchError::Transport {
            kind: "user",
            source: TransportError::NotFound("u1".into()),
        };
        assert!(err.source().is_some());
        assert!(FetchError::NotAuthenticated.source().is_none());
    }
}
