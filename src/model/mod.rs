//! Domain records held in collection snapshots
//!
//! Every list screen works over one of two record types, [`Card`] and
//! [`User`]. The engine itself only sees them through the [`Entity`] trait:
//! an optional remote id, a set of liking user ids, a creation timestamp and
//! a way to resolve search key paths to text.
//!
//! # Wire Format
//!
//! Records use the remote service's JSON shape (`_id`, camelCase fields).
//! Use [`decode_entities`] to parse a fetched list.

pub mod card;
pub mod normalize;
pub mod snapshot;
pub mod user;

pub use card::Card;
pub use normalize::{CardForm, UserForm};
pub use snapshot::Snapshot;
pub use user::{Name, User};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Which collection an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Card,
    User,
}

impl EntityKind {
    /// Lowercase noun used inside sentences ("Failed to delete card")
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::User => "user",
        }
    }

    /// Capitalized noun used at the start of a sentence
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::User => "User",
        }
    }
}

/// A record that can live in a [`Snapshot`]
///
/// Implementors are plain data. The engine never interprets domain fields
/// except through [`Entity::search_value`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Collection this type belongs to
    const KIND: EntityKind;

    /// Remote id, absent until the record has been created remotely
    fn id(&self) -> Option<&str>;

    /// Set the remote id (called by transports on create)
    fn assign_id(&mut self, id: String);

    /// Ids of users that favorited this record
    ///
    /// Records without favorites (users) return an empty slice.
    fn likes(&self) -> &[String];

    /// Mutable access to the likes set, `None` when the type has no likes
    fn likes_mut(&mut self) -> Option<&mut Vec<String>>;

    /// Raw creation timestamp as received, `None` when missing or blank
    fn created_at_raw(&self) -> Option<&str>;

    /// Resolve a dotted key path (e.g. `address.city`) to searchable text
    fn search_value(&self, key: &str) -> Option<String>;

    /// Key paths indexed by default for this type
    fn default_search_keys() -> &'static [&'static str];

    /// Id of the user that owns the record, `None` for unowned types
    fn owner_id(&self) -> Option<&str> {
        None
    }

    /// Parsed creation timestamp, `None` when missing or unparsable
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw().and_then(parse_timestamp)
    }

    /// Whether `key` names a searchable path of this type
    fn supports_key(key: &str) -> bool {
        Self::default_search_keys().contains(&key)
    }

    /// Whether `user_id` is in the likes set
    fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes().iter().any(|id| id == user_id)
    }

    /// Flip membership of `user_id` in the likes set
    ///
    /// Returns `true` when the user likes the record afterwards. Types
    /// without likes are left untouched and return `false`.
    fn toggle_like(&mut self, user_id: &str) -> bool {
        let Some(likes) = self.likes_mut() else {
            return false;
        };

        if let Some(pos) = likes.iter().position(|id| id == user_id) {
            likes.remove(pos);
            false
        } else {
            likes.push(user_id.to_string());
            true
        }
    }

    /// Make membership of `user_id` in the likes set equal `liked`
    fn set_liked(&mut self, user_id: &str, liked: bool) {
        if self.is_liked_by(user_id) != liked {
            self.toggle_like(user_id);
        }
    }
}

/// Image reference attached to cards and users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

/// Postal address shared by cards and users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house_number: u32,
    #[serde(default)]
    pub zip: u64,
}

impl Address {
    /// Resolve the part of a key path after `address.`
    #[must_use]
    pub fn search_value(&self, field: &str) -> Option<String> {
        match field {
            "state" => non_empty(&self.state),
            "country" => non_empty(&self.country),
            "city" => non_empty(&self.city),
            "street" => non_empty(&self.street),
            "houseNumber" => Some(self.house_number.to_string()),
            "zip" => Some(self.zip.to_string()),
            _ => None,
        }
    }
}

/// Parse a creation timestamp
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and a
/// bare date. Anything else is `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decode a JSON array of records as returned by the remote service
///
/// # Errors
///
/// Returns the `serde_json` error if the payload is not an array of records.
pub fn decode_entities<E: DeserializeOwned>(json: &[u8]) -> Result<Vec<E>, serde_json::Error> {
    serde_json::from_slice(json)
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Deserialize a likes array, dropping repeated ids
pub(crate) fn dedup_likes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    let mut likes: Vec<String> = Vec::new();
    for id in raw {
        if !likes.contains(&id) {
            likes.push(id);
        }
    }
    Ok(likes)
}
