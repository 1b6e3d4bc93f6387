//! Per-id single-flight queue
//!
//! Mutations on the same entity id run one at a time, in arrival order;
//! different ids do not wait on each other. An id's slot counts everyone
//! holding or waiting for it and is removed when that count drops to zero,
//! including when a waiting mutation is cancelled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

#[derive(Debug, Default)]
pub(crate) struct IdQueue {
    slots: Mutex<HashMap<String, Slot>>,
}

impl IdQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait until no other mutation on `id` is running
    pub(crate) async fn acquire(&self, id: &str) -> Turn<'_> {
        let lock = {
            let mut slots = self.lock();
            let slot = slots.entry(id.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        // Registered before waiting, so dropping this future releases the slot.
        let mut turn = Turn {
            queue: self,
            id: id.to_string(),
            guard: None,
        };
        turn.guard = Some(lock.lock_owned().await);
        turn
    }

    /// Ids with a running or waiting mutation
    pub(crate) fn active(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, id: &str) {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(id) else {
            return;
        };
        slot.users = slot.users.saturating_sub(1);
        if slot.users == 0 {
            slots.remove(id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive turn on one id, released on drop
pub(crate) struct Turn<'a> {
    queue: &'a IdQueue,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.queue.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slot_removed_after_last_turn() {
        let queue = IdQueue::new();
        {
            let _turn = queue.acquire("a").await;
            assert_eq!(queue.active(), 1);
        }
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_id_waits_other_id_does_not() {
        let queue = Arc::new(IdQueue::new());
        let first = queue.acquire("a").await;

        let same = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move {
                let _turn = queue.acquire("a").await;
            }
        });
        let other = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move {
                let _turn = queue.acquire("b").await;
            }
        });

        other.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!same.is_finished());

        drop(first);
        same.await.unwrap();
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_releases_slot() {
        let queue = Arc::new(IdQueue::new());
        let first = queue.acquire("a").await;

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move {
                let _turn = queue.acquire("a").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(first);
        waiter.abort();
        let _ = waiter.await;

        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_keeps_holder_slot() {
        let queue = Arc::new(IdQueue::new());
        let first = queue.acquire("a").await;

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move {
                let _turn = queue.acquire("a").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        assert_eq!(queue.active(), 1);
        drop(first);
        assert_eq!(queue.active(), 0);

        let _again = queue.acquire("a").await;
        assert_eq!(queue.active(), 1);
    }
}
