//! Boundary to the remote record store
//!
//! The transport is an external collaborator: it knows URLs, headers and
//! encodings. The engine only calls the six operations below and forwards
//! the session's bearer credential untouched.
//!
//! [`MockTransport`] is an in-memory implementation with failure and
//! latency injection, used by tests and demos.

pub mod error;
pub mod mock;

pub use error::TransportError;
pub use mock::{MockTransport, Operation};

use crate::model::Entity;
use crate::session::BearerToken;
use std::future::Future;
use std::sync::Arc;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Remote CRUD operations for one collection
pub trait Transport<E: Entity>: Send + Sync {
    /// Fetch the whole collection
    fn fetch_all(
        &self,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<Vec<E>>> + Send;

    /// Fetch a single record
    fn fetch_one(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send;

    /// Create a record; the returned copy carries the assigned id
    fn create(
        &self,
        entity: &E,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send;

    /// Replace the record with `id`
    fn update(
        &self,
        id: &str,
        entity: &E,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send;

    /// Toggle the caller's favorite on `id`
    ///
    /// The service decides the new membership from the credential.
    fn patch_favorite(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete the record with `id`
    fn remove(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<E, T> Transport<E> for Arc<T>
where
    E: Entity,
    T: Transport<E>,
{
    fn fetch_all(
        &self,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<Vec<E>>> + Send {
        (**self).fetch_all(credential)
    }

    fn fetch_one(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send {
        (**self).fetch_one(id, credential)
    }

    fn create(
        &self,
        entity: &E,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send {
        (**self).create(entity, credential)
    }

    fn update(
        &self,
        id: &str,
        entity: &E,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<E>> + Send {
        (**self).update(id, entity, credential)
    }

    fn patch_favorite(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).patch_favorite(id, credential)
    }

    fn remove(
        &self,
        id: &str,
        credential: Option<&BearerToken>,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).remove(id, credential)
    }
}
