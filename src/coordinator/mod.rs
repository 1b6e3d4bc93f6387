//! Remote mutations reconciled into entity caches
//!
//! Every user action follows call-then-reconcile: the remote call is made
//! first, and the cache changes only once it succeeds. A failed call leaves
//! the cache exactly as it was and reports the failure to the user, so the
//! displayed state is one round trip behind the click but never wrong.
//!
//! # Linked Caches
//!
//! A screen may show the same entity in more than one cache (the favorites
//! view and the home feed). Caches registered with
//! [`MutationCoordinator::link`] receive the committed result too: favorite
//! membership is set to the same value, deletes remove the entity, updates
//! replace it where present.
//!
//! # Ordering
//!
//! Mutations on the same id are serialized; the second starts only after
//! the first has committed or rolled back. Mutations on different ids run
//! concurrently.

pub mod error;
mod queue;

pub use error::{MutationError, MutationKind};

use crate::cache::EntityCache;
use crate::model::Entity;
use crate::notify::NotificationPort;
use crate::session::Session;
use crate::transport::{Transport, TransportError};
use queue::IdQueue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle of the latest mutation on one id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    /// No mutation seen yet
    #[default]
    Idle,
    /// Remote call in flight
    Pending,
    Committed,
    RolledBack,
}

/// Result of one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote call succeeded and the caches were updated
    Committed,
    /// The remote call failed; the caches are unchanged
    RolledBack(MutationError),
    /// Nothing was attempted (no signed-in user)
    Skipped,
}

impl MutationOutcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Applies user actions to the remote store and to entity caches
pub struct MutationCoordinator<E: Entity, T> {
    cache: Arc<EntityCache<E, T>>,
    linked: Vec<Arc<EntityCache<E, T>>>,
    notifier: Arc<dyn NotificationPort>,
    session: Session,
    queue: IdQueue,
    states: Mutex<HashMap<String, MutationState>>,
}

impl<E, T> MutationCoordinator<E, T>
where
    E: Entity,
    T: Transport<E>,
{
    /// Coordinate mutations for `cache`, acting as the cache's session
    #[must_use]
    pub fn new(cache: Arc<EntityCache<E, T>>, notifier: Arc<dyn NotificationPort>) -> Self {
        let session = cache.session().clone();
        Self {
            cache,
            linked: Vec::new(),
            notifier,
            session,
            queue: IdQueue::new(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Also reconcile committed mutations into `cache`
    #[must_use]
    pub fn link(mut self, cache: Arc<EntityCache<E, T>>) -> Self {
        self.linked.push(cache);
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<EntityCache<E, T>> {
        &self.cache
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// State of the latest mutation on `id`
    ///
    /// A committed delete forgets the id, which reads as `Idle` again.
    #[must_use]
    pub fn state(&self, id: &str) -> MutationState {
        self.states().get(id).copied().unwrap_or_default()
    }

    /// Ids with a mutation running or waiting
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.queue.active()
    }

    /// Toggle the favorite mark of `acting_user` on entity `id`
    ///
    /// Without an acting user nothing happens and the outcome is
    /// [`MutationOutcome::Skipped`]. With `remove_on_untoggle`, entities the
    /// user no longer likes are dropped from the primary cache (the
    /// favorites view); linked caches keep them with the new membership.
    pub async fn toggle_favorite(&self, id: &str, acting_user: Option<&str>, remove_on_untoggle: bool) -> MutationOutcome {
        let Some(user_id) = acting_user else {
            tracing::debug!(id, "favorite toggle without a signed-in user, skipping");
            return MutationOutcome::Skipped;
        };

        let _turn = self.queue.acquire(id).await;
        self.set_state(id, MutationState::Pending);

        let was_liked = self.lookup(id).is_some_and(|entity| entity.is_liked_by(user_id));

        match self.transport().patch_favorite(id, self.session.token()).await {
            Ok(()) => {
                let liked = !was_liked;
                self.cache.apply_local(id, |entity| entity.set_liked(user_id, liked));
                if remove_on_untoggle {
                    self.cache.retain(|entity| entity.is_liked_by(user_id));
                }
                for cache in &self.linked {
                    cache.apply_local(id, |entity| entity.set_liked(user_id, liked));
                }

                tracing::info!(kind = E::KIND.label(), id, user_id, liked, "favorite committed");
                self.set_state(id, MutationState::Committed);
                MutationOutcome::Committed
            }
            Err(source) => MutationOutcome::RolledBack(self.roll_back(Some(id), MutationKind::Favorite, source)),
        }
    }

    /// [`toggle_favorite`](Self::toggle_favorite) as the session's user
    pub async fn toggle_favorite_as_session_user(&self, id: &str, remove_on_untoggle: bool) -> MutationOutcome {
        let user_id = self.session.user_id().map(str::to_string);
        self.toggle_favorite(id, user_id.as_deref(), remove_on_untoggle)
            .await
    }

    /// Delete entity `id` remotely, then from every cache
    ///
    /// Reports "<Kind> deleted successfully" or "Failed to delete <kind>".
    pub async fn delete_entity(&self, id: &str) -> MutationOutcome {
        let _turn = self.queue.acquire(id).await;
        self.set_state(id, MutationState::Pending);

        match self.transport().remove(id, self.session.token()).await {
            Ok(()) => {
                self.cache.remove(id);
                for cache in &self.linked {
                    cache.remove(id);
                }

                self.report_success(MutationKind::Delete);
                tracing::info!(kind = E::KIND.label(), id, "delete committed");
                self.states().remove(id);
                MutationOutcome::Committed
            }
            Err(source) => MutationOutcome::RolledBack(self.roll_back(Some(id), MutationKind::Delete, source)),
        }
    }

    /// Create `entity` remotely and add the stored copy to the cache
    ///
    /// # Errors
    ///
    /// Returns `MutationError` if the remote call fails; the cache is
    /// unchanged.
    pub async fn create_entity(&self, entity: E) -> Result<E, MutationError> {
        match self.transport().create(&entity, self.session.token()).await {
            Ok(created) => {
                self.cache.insert(created.clone());
                self.report_success(MutationKind::Create);

                let id = created.id().unwrap_or_default();
                tracing::info!(kind = E::KIND.label(), id, "create committed");
                if !id.is_empty() {
                    self.set_state(id, MutationState::Committed);
                }
                Ok(created)
            }
            Err(source) => Err(self.roll_back(None, MutationKind::Create, source)),
        }
    }

    /// Replace entity `id` remotely, then in every cache holding it
    ///
    /// # Errors
    ///
    /// Returns `MutationError` if the remote call fails; the caches are
    /// unchanged.
    pub async fn update_entity(&self, id: &str, entity: E) -> Result<E, MutationError> {
        let _turn = self.queue.acquire(id).await;
        self.set_state(id, MutationState::Pending);

        match self.transport().update(id, &entity, self.session.token()).await {
            Ok(updated) => {
                self.cache.insert(updated.clone());
                for cache in &self.linked {
                    cache.apply_local(id, |existing| *existing = updated.clone());
                }

                self.report_success(MutationKind::Update);
                tracing::info!(kind = E::KIND.label(), id, "update committed");
                self.set_state(id, MutationState::Committed);
                Ok(updated)
            }
            Err(source) => Err(self.roll_back(Some(id), MutationKind::Update, source)),
        }
    }

    fn transport(&self) -> &T {
        self.cache.transport()
    }

    /// Current copy of `id` in the primary cache, else in a linked one
    fn lookup(&self, id: &str) -> Option<E> {
        self.cache
            .get(id)
            .or_else(|| self.linked.iter().find_map(|cache| cache.get(id)))
    }

    fn roll_back(&self, id: Option<&str>, action: MutationKind, source: TransportError) -> MutationError {
        let err = MutationError::remote(action, E::KIND, source);
        tracing::warn!(kind = E::KIND.label(), id, error = %err, "mutation rolled back");
        self.notifier.report_failure(&err.user_message());
        if let Some(id) = id {
            self.set_state(id, MutationState::RolledBack);
        }
        err
    }

    fn report_success(&self, action: MutationKind) {
        self.notifier
            .report_success(&format!("{} {} successfully", E::KIND.title(), action.past_tense()));
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, MutationState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, id: &str, state: MutationState) {
        self.states().insert(id.to_string(), state);
    }
}
