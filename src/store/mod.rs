//! Durable hand-off slot for the home-feed snapshot
//!
//! The home feed writes its full card list here on every successful fetch;
//! the search screen reads it at mount time instead of hitting the network.
//!
//! The slot is a single sled key, overwritten on each write. It is a
//! point-in-time copy: favorites and deletes made after the write are not
//! reflected until the home feed fetches again.

pub mod error;

pub use error::StoreError;

use crate::model::{Entity, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::{Db, Tree};
use std::marker::PhantomData;
use std::path::Path;

/// Default key holding the home-feed card list
pub const HANDOFF_KEY: &str = "allCards";

const SLOT_TREE: &str = "snapshots";
const SLOT_VERSION: u32 = 1;

/// A single keyed slot holding one snapshot
pub trait SnapshotSlot<E: Entity>: Send + Sync {
    /// Overwrite the slot with `snapshot`
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding or the write fails.
    fn persist(&self, snapshot: &Snapshot<E>) -> Result<(), StoreError>;

    /// Read the slot, `None` when it was never written or is unreadable
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying read fails.
    fn read(&self) -> Result<Option<Snapshot<E>>, StoreError>;
}

#[derive(Serialize)]
struct PersistedRef<'a, E> {
    version: u32,
    saved_at: DateTime<Utc>,
    entities: &'a [E],
}

#[derive(serde::Deserialize)]
struct Persisted<E> {
    version: u32,
    saved_at: DateTime<Utc>,
    entities: Vec<E>,
}

/// Sled-backed [`SnapshotSlot`]
pub struct SledSnapshotSlot<E> {
    _db: Db,
    tree: Tree,
    key: String,
    _marker: PhantomData<fn() -> E>,
}

impl<E> SledSnapshotSlot<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    /// Open (or create) the slot database at `path`
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database or its tree cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, key: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db, key)
    }

    /// Slot backed by a throwaway database, removed on drop
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the temporary database cannot be created.
    pub fn temporary(key: &str) -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, key)
    }

    /// Use an already opened database
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the slot tree cannot be opened.
    pub fn from_db(db: Db, key: &str) -> Result<Self, StoreError> {
        let tree = db.open_tree(SLOT_TREE)?;
        Ok(Self {
            _db: db,
            tree,
            key: key.to_string(),
            _marker: PhantomData,
        })
    }

    /// When the slot was last written
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying read fails.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read_persisted()?.map(|persisted| persisted.saved_at))
    }

    /// Empty the slot
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the removal fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.tree.remove(self.key.as_bytes())?;
        Ok(())
    }

    fn read_persisted(&self) -> Result<Option<Persisted<E>>, StoreError> {
        let Some(bytes) = self.tree.get(self.key.as_bytes())? else {
            return Ok(None);
        };

        match bincode::serde::decode_from_slice::<Persisted<E>, _>(&bytes, bincode::config::standard()) {
            Ok((persisted, _)) if persisted.version == SLOT_VERSION => Ok(Some(persisted)),
            Ok((persisted, _)) => {
                tracing::warn!(
                    key = %self.key,
                    found = persisted.version,
                    expected = SLOT_VERSION,
                    "ignoring snapshot slot with unknown version"
                );
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "ignoring unreadable snapshot slot");
                Ok(None)
            }
        }
    }
}

impl<E> SnapshotSlot<E> for SledSnapshotSlot<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    fn persist(&self, snapshot: &Snapshot<E>) -> Result<(), StoreError> {
        let value = PersistedRef {
            version: SLOT_VERSION,
            saved_at: Utc::now(),
            entities: snapshot.entities(),
        };
        let bytes = bincode::serde::encode_to_vec(&value, bincode::config::standard())?;
        self.tree.insert(self.key.as_bytes(), bytes)?;
        self.tree.flush()?;

        tracing::debug!(key = %self.key, count = snapshot.len(), "persisted snapshot slot");
        Ok(())
    }

    fn read(&self) -> Result<Option<Snapshot<E>>, StoreError> {
        Ok(self
            .read_persisted()?
            .map(|persisted| Snapshot::new(persisted.entities)))
    }
}
