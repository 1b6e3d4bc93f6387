//! Mutation error types
//!
//! A failed mutation leaves the cache untouched and is reported to the
//! user once. Nothing retries automatically.

use crate::model::EntityKind;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// User action a mutation carries out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Favorite,
    Delete,
    Create,
    Update,
}

impl MutationKind {
    /// Verb used in failure messages ("Failed to delete card")
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    /// Past tense used in success messages ("Card deleted successfully")
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Favorite => "favorited",
            Self::Delete => "deleted",
            Self::Create => "created",
            Self::Update => "updated",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A mutation was rolled back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The remote call failed
    #[error("Failed to {action} {}: {source}", kind.label())]
    Remote {
        action: MutationKind,
        kind: EntityKind,
        source: TransportError,
    },
}

impl MutationError {
    #[must_use]
    pub const fn remote(action: MutationKind, kind: EntityKind, source: TransportError) -> Self {
        Self::Remote { action, kind, source }
    }

    #[must_use]
    pub const fn action(&self) -> MutationKind {
        match self {
            Self::Remote { action, .. } => *action,
        }
    }

    /// Message shown to the user, without transport details
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { action, kind, .. } => format!("Failed to {} {}", action.verb(), kind.label()),
        }
    }
}
