//! Full in-memory copy of one collection
//!
//! A snapshot carries a process-unique revision. Any change to the entity
//! list produces a new revision, which is what search indices key on to
//! detect that they were built over different data.

use super::Entity;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Ordered set of entities with unique ids
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<E> {
    entities: Vec<E>,
    revision: u64,
}

impl<E: Entity> Snapshot<E> {
    /// Build a snapshot, keeping the first occurrence of any repeated id
    #[must_use]
    pub fn new(entities: Vec<E>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let before = entities.len();
        let entities: Vec<E> = entities
            .into_iter()
            .filter(|entity| entity.id().is_none_or(|id| seen.insert(id.to_string())))
            .collect();

        if entities.len() != before {
            tracing::warn!(
                kind = E::KIND.label(),
                dropped = before - entities.len(),
                "dropped entities with duplicate ids"
            );
        }

        Self {
            entities,
            revision: next_revision(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            entities: Vec::new(),
            revision: next_revision(),
        }
    }

    #[must_use]
    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    #[must_use]
    pub fn into_entities(self) -> Vec<E> {
        self.entities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entities.iter()
    }

    /// Revision identifying this exact entity list
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&E> {
        self.entities.iter().find(|entity| entity.id() == Some(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Apply `mutator` to the entity with `id`
    ///
    /// Returns `false` and leaves the snapshot (and its revision) untouched
    /// when no entity matches.
    pub(crate) fn apply<F>(&mut self, id: &str, mutator: F) -> bool
    where
        F: FnOnce(&mut E),
    {
        let Some(entity) = self.entities.iter_mut().find(|e| e.id() == Some(id)) else {
            return false;
        };
        mutator(entity);
        self.revision = next_revision();
        true
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<E> {
        let pos = self.entities.iter().position(|e| e.id() == Some(id))?;
        self.revision = next_revision();
        Some(self.entities.remove(pos))
    }

    /// Keep entities matching `keep`, returning how many were dropped
    pub(crate) fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&E) -> bool,
    {
        let before = self.entities.len();
        self.entities.retain(keep);
        let dropped = before - self.entities.len();
        if dropped > 0 {
            self.revision = next_revision();
        }
        dropped
    }

    /// Replace the entity with the same id, or append it
    pub(crate) fn upsert(&mut self, entity: E) {
        let existing = entity
            .id()
            .and_then(|id| self.entities.iter().position(|e| e.id() == Some(id)));

        match existing {
            Some(pos) => self.entities[pos] = entity,
            None => self.entities.push(entity),
        }
        self.revision = next_revision();
    }
}

impl<E: Entity> Default for Snapshot<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E: Entity> From<Vec<E>> for Snapshot<E> {
    fn from(entities: Vec<E>) -> Self {
        Self::new(entities)
    }
}

impl<'a, E> IntoIterator for &'a Snapshot<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;

    fn snapshot() -> Snapshot<Card> {
        Snapshot::new(vec![Card::new("a", "A"), Card::new("b", "B"), Card::new("c", "C")])
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let snap = Snapshot::new(vec![Card::new("a", "first"), Card::new("a", "second")]);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("a").unwrap().title, "first");
    }

    #[test]
    fn test_cards_without_id_are_kept() {
        let snap = Snapshot::new(vec![Card::default(), Card::default()]);
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn test_revisions_are_unique() {
        assert_ne!(snapshot().revision(), snapshot().revision());
    }

    #[test]
    fn test_apply_missing_id_is_noop() {
        let mut snap = snapshot();
        let before = snap.clone();
        assert!(!snap.apply("zzz", |card| card.title = "changed".into()));
        assert_eq!(snap, before);
    }

    #[test]
    fn test_apply_hits_one_entity_and_bumps_revision() {
        let mut snap = snapshot();
        let revision = snap.revision();
        assert!(snap.apply("b", |card| card.title = "changed".into()));
        assert_eq!(snap.get("b").unwrap().title, "changed");
        assert_eq!(snap.get("a").unwrap().title, "A");
        assert_ne!(snap.revision(), revision);
    }

    #[test]
    fn test_remove() {
        let mut snap = snapshot();
        let before = snap.clone();
        assert!(snap.remove("zzz").is_none());
        assert_eq!(snap, before);

        assert_eq!(snap.remove("a").unwrap().title, "A");
        assert_eq!(snap.len(), 2);
        assert!(!snap.contains("a"));
    }

    #[test]
    fn test_retain_without_drop_keeps_revision() {
        let mut snap = snapshot();
        let revision = snap.revision();
        assert_eq!(snap.retain(|_| true), 0);
        assert_eq!(snap.revision(), revision);
        assert_eq!(snap.retain(|card| card.title != "B"), 1);
        assert_ne!(snap.revision(), revision);
    }

    #[test]
    fn test_upsert_replaces_or_appends() {
        let mut snap = snapshot();
        snap.upsert(Card::new("b", "B2"));
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.entities()[1].title, "B2");

        snap.upsert(Card::new("d", "D"));
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.entities()[3].title, "D");
    }
}
