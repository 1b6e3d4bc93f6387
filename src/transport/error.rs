//! Transport-specific error types
//!
//! Raised by [`Transport`](super::Transport) implementations. These never
//! reach the view layer directly: caches convert them into
//! [`FetchError`](crate::cache::FetchError) and the coordinator into
//! [`MutationError`](crate::coordinator::MutationError).

use thiserror::Error;

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The record does not exist remotely
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the failure came from the service rejecting the credential
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
