//! Per-screen entity cache
//!
//! Holds the last known snapshot of one collection and publishes every
//! change through a [`tokio::sync::watch`] channel, so screens re-render
//! from [`EntityCache::subscribe`] instead of polling.
//!
//! # Fetch Ordering
//!
//! Every fetch takes a sequence number when it is issued. When it
//! completes, the result is applied only if no later-issued fetch (or
//! [`EntityCache::replace`]) has been applied already; otherwise it is
//! discarded and the newer snapshot is returned.
//!
//! # Home-Feed Hand-off
//!
//! A cache built [`with_handoff`](EntityCache::with_handoff) writes each
//! accepted fetch to a [`SnapshotSlot`]. A cache built
//! [`from_handoff`](EntityCache::from_handoff) starts from that slot and
//! never fetches on [`load`](EntityCache::load). The slot is not updated by
//! local mutations, so the search screen may see stale data until the home
//! feed fetches again.

pub mod error;

pub use error::FetchError;

use crate::model::{Entity, Snapshot};
use crate::session::Session;
use crate::store::SnapshotSlot;
use crate::transport::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Predicate applied to every fetched entity before it enters the cache
pub type FetchFilter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Last known snapshot of one collection
pub struct EntityCache<E: Entity, T> {
    transport: Arc<T>,
    session: Session,
    state: watch::Sender<Option<Snapshot<E>>>,
    issued: AtomicU64,
    applied: AtomicU64,
    handoff: Option<Arc<dyn SnapshotSlot<E>>>,
    fetch_filter: Option<FetchFilter<E>>,
    requires_auth: bool,
}

impl<E, T> EntityCache<E, T>
where
    E: Entity,
    T: Transport<E>,
{
    /// Create an empty cache that fetches through `transport`
    #[must_use]
    pub fn new(transport: Arc<T>, session: Session) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            transport,
            session,
            state,
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            handoff: None,
            fetch_filter: None,
            requires_auth: false,
        }
    }

    /// Cache for the search screen, seeded from the home-feed slot
    ///
    /// An empty or unreadable slot seeds an empty snapshot. The data is as
    /// old as the last home-feed fetch.
    #[must_use]
    pub fn from_handoff(transport: Arc<T>, session: Session, slot: &dyn SnapshotSlot<E>) -> Self {
        let seeded = match slot.read() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => Snapshot::empty(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read snapshot slot, starting empty");
                Snapshot::empty()
            }
        };

        let cache = Self::new(transport, session);
        cache.replace(seeded);
        cache
    }

    /// Persist every accepted fetch to `slot`
    #[must_use]
    pub fn with_handoff(mut self, slot: Arc<dyn SnapshotSlot<E>>) -> Self {
        self.handoff = Some(slot);
        self
    }

    /// Keep only fetched entities matching `filter`
    #[must_use]
    pub fn with_fetch_filter(mut self, filter: FetchFilter<E>) -> Self {
        self.fetch_filter = Some(filter);
        self
    }

    /// Refuse to fetch without a signed-in user
    #[must_use]
    pub const fn requires_auth(mut self, required: bool) -> Self {
        self.requires_auth = required;
        self
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Current snapshot, `None` before the first load
    #[must_use]
    pub fn current(&self) -> Option<Snapshot<E>> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every change of the snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<E>>> {
        self.state.subscribe()
    }

    /// Copy of the entity with `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<E> {
        self.state
            .borrow()
            .as_ref()
            .and_then(|snapshot| snapshot.get(id).cloned())
    }

    /// Return the cached snapshot, fetching it on first use
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the transport fails or the cache requires a
    /// signed-in user and there is none.
    pub async fn load(&self) -> Result<Snapshot<E>, FetchError> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        self.fetch().await
    }

    /// Load, then keep only entities matching `keep`
    ///
    /// Used by the favorites screen over the full card list.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the load fails.
    pub async fn load_filtered<F>(&self, keep: F) -> Result<Snapshot<E>, FetchError>
    where
        F: FnMut(&E) -> bool,
    {
        self.load().await?;
        Ok(self.retain(keep))
    }

    /// Fetch the collection again, regardless of what is cached
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failure; the cached snapshot is
    /// left as it was.
    pub async fn refresh(&self) -> Result<Snapshot<E>, FetchError> {
        self.fetch().await
    }

    /// Re-fetch a single entity and put it in place
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failure.
    pub async fn refresh_one(&self, id: &str) -> Result<Snapshot<E>, FetchError> {
        self.check_auth()?;
        let entity = self
            .transport
            .fetch_one(id, self.session.token())
            .await
            .map_err(|source| FetchError::Transport {
                kind: E::KIND.label(),
                source,
            })?;
        Ok(self.insert(entity))
    }

    /// Apply `mutator` to the entity with `id`
    ///
    /// Missing id (or nothing loaded yet) is a no-op returning the
    /// snapshot unchanged.
    pub fn apply_local<F>(&self, id: &str, mutator: F) -> Snapshot<E>
    where
        F: FnOnce(&mut E),
    {
        self.modify(|snapshot| snapshot.apply(id, mutator))
    }

    /// Remove the entity with `id`; no-op when absent
    pub fn remove(&self, id: &str) -> Snapshot<E> {
        self.modify(|snapshot| snapshot.remove(id).is_some())
    }

    /// Keep only entities matching `keep`
    pub fn retain<F>(&self, keep: F) -> Snapshot<E>
    where
        F: FnMut(&E) -> bool,
    {
        self.modify(|snapshot| snapshot.retain(keep) > 0)
    }

    /// Put a committed entity in place, replacing one with the same id
    ///
    /// Before the first load this is a no-op, so that `load` still fetches
    /// the whole collection.
    pub fn insert(&self, entity: E) -> Snapshot<E> {
        self.modify(|snapshot| {
            snapshot.upsert(entity);
            true
        })
    }

    /// Replace the whole snapshot
    ///
    /// Counts as the newest fetch: completions of fetches issued earlier
    /// are discarded.
    pub fn replace(&self, snapshot: Snapshot<E>) {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            self.applied.fetch_max(seq, Ordering::SeqCst);
            *state = Some(snapshot);
        });
    }

    /// Drop the cached snapshot; the next `load` fetches again
    pub fn invalidate(&self) {
        self.state.send_if_modified(|state| state.take().is_some());
    }

    fn modify<F>(&self, change: F) -> Snapshot<E>
    where
        F: FnOnce(&mut Snapshot<E>) -> bool,
    {
        self.state.send_if_modified(|state| match state.as_mut() {
            Some(snapshot) => change(snapshot),
            None => false,
        });
        self.current().unwrap_or_default()
    }

    fn check_auth(&self) -> Result<(), FetchError> {
        if self.requires_auth && !self.session.is_authenticated() {
            return Err(FetchError::NotAuthenticated);
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<Snapshot<E>, FetchError> {
        self.check_auth()?;

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let entities = self
            .transport
            .fetch_all(self.session.token())
            .await
            .map_err(|source| {
                tracing::warn!(kind = E::KIND.label(), error = %source, "fetch failed");
                FetchError::Transport {
                    kind: E::KIND.label(),
                    source,
                }
            })?;

        let entities = match &self.fetch_filter {
            Some(keep) => entities.into_iter().filter(|entity| keep(entity)).collect(),
            None => entities,
        };
        let snapshot = Snapshot::new(entities);

        let accepted = self.state.send_if_modified(|state| {
            if seq <= self.applied.load(Ordering::SeqCst) {
                return false;
            }
            self.applied.store(seq, Ordering::SeqCst);
            *state = Some(snapshot.clone());
            true
        });

        if !accepted {
            tracing::debug!(
                kind = E::KIND.label(),
                seq,
                "discarding fetch that completed after a newer one"
            );
            return Ok(self.current().unwrap_or(snapshot));
        }

        if let Some(slot) = &self.handoff {
            if let Err(err) = slot.persist(&snapshot) {
                tracing::warn!(error = %err, "failed to persist snapshot hand-off");
            }
        }

        tracing::debug!(kind = E::KIND.label(), count = snapshot.len(), seq, "snapshot loaded");
        Ok(snapshot)
    }
}

/// Fetch filter keeping entities liked by `user_id` (favorites screen)
#[must_use]
pub fn liked_by<E: Entity>(user_id: &str) -> FetchFilter<E> {
    let user_id = user_id.to_string();
    Arc::new(move |entity: &E| entity.is_liked_by(&user_id))
}

/// Fetch filter keeping entities owned by `user_id` (my-cards screen)
#[must_use]
pub fn owned_by<E: Entity>(user_id: &str) -> FetchFilter<E> {
    let user_id = user_id.to_string();
    Arc::new(move |entity: &E| entity.owner_id() == Some(user_id.as_str()))
}
