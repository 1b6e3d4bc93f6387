//! Business card record

use super::{Address, Entity, EntityKind, Image, dedup_likes, non_empty};
use serde::{Deserialize, Serialize};

const CARD_SEARCH_KEYS: &[&str] = &[
    "title",
    "subtitle",
    "description",
    "phone",
    "email",
    "address.state",
    "address.country",
    "address.city",
    "address.street",
    "address.houseNumber",
    "address.zip",
    "bizNumber",
    "createdAt",
];

/// A business card as stored by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Remote id (`_id` on the wire)
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub web: Option<String>,

    #[serde(default)]
    pub image: Image,

    #[serde(default)]
    pub address: Address,

    /// Business number assigned by the service
    #[serde(default)]
    pub biz_number: Option<u64>,

    /// Ids of users that favorited this card
    #[serde(default, deserialize_with = "dedup_likes")]
    pub likes: Vec<String>,

    /// Id of the user that owns the card
    #[serde(rename = "user_id", default)]
    pub owner_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Card {
    /// Create a card with just an id and a title
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    #[must_use]
    pub fn with_likes<I, S>(mut self, likes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.likes.clear();
        for id in likes {
            let id = id.into();
            if !self.likes.contains(&id) {
                self.likes.push(id);
            }
        }
        self
    }
}

impl Entity for Card {
    const KIND: EntityKind = EntityKind::Card;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn likes(&self) -> &[String] {
        &self.likes
    }

    fn likes_mut(&mut self) -> Option<&mut Vec<String>> {
        Some(&mut self.likes)
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn created_at_raw(&self) -> Option<&str> {
        self.created_at.as_deref().filter(|raw| !raw.trim().is_empty())
    }

    fn search_value(&self, key: &str) -> Option<String> {
        match key {
            "title" => non_empty(&self.title),
            "subtitle" => non_empty(&self.subtitle),
            "description" => non_empty(&self.description),
            "phone" => non_empty(&self.phone),
            "email" => non_empty(&self.email),
            "bizNumber" => self.biz_number.map(|n| n.to_string()),
            "createdAt" => self.created_at_raw().map(str::to_string),
            _ => key
                .strip_prefix("address.")
                .and_then(|field| self.address.search_value(field)),
        }
    }

    fn default_search_keys() -> &'static [&'static str] {
        CARD_SEARCH_KEYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decode_entities;

    const CARDS_JSON: &str = r#"[
        {
            "_id": "c1",
            "title": "Pizza Place",
            "subtitle": "Best slices",
            "description": "Family pizzeria",
            "phone": "050-1234567",
            "email": "pizza@example.com",
            "image": { "url": "https://example.com/p.png", "alt": "pizza" },
            "address": { "state": "", "country": "Israel", "city": "Haifa", "street": "Herzl", "houseNumber": 5, "zip": 31000 },
            "bizNumber": 1234567,
            "likes": ["u1", "u2", "u1"],
            "user_id": "owner-1",
            "createdAt": "2024-01-02T03:04:05.000Z"
        },
        { "_id": "c2", "title": "Bare" }
    ]"#;

    #[test]
    fn test_decode_wire_format() {
        let cards: Vec<Card> = decode_entities(CARDS_JSON.as_bytes()).unwrap();
        assert_eq!(cards.len(), 2);

        let card = &cards[0];
        assert_eq!(card.id(), Some("c1"));
        assert_eq!(card.address.city, "Haifa");
        assert_eq!(card.address.house_number, 5);
        assert_eq!(card.biz_number, Some(1_234_567));
        assert_eq!(card.owner_id.as_deref(), Some("owner-1"));
        assert!(card.created_at().is_some());
    }

    #[test]
    fn test_decode_drops_duplicate_likes() {
        let cards: Vec<Card> = decode_entities(CARDS_JSON.as_bytes()).unwrap();
        assert_eq!(cards[0].likes, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn test_decode_missing_fields_default() {
        let cards: Vec<Card> = decode_entities(CARDS_JSON.as_bytes()).unwrap();
        let bare = &cards[1];
        assert!(bare.likes.is_empty());
        assert!(bare.created_at().is_none());
        assert_eq!(bare.search_value("subtitle"), None);
        assert_eq!(bare.search_value("bizNumber"), None);
    }

    #[test]
    fn test_search_value_paths() {
        let cards: Vec<Card> = decode_entities(CARDS_JSON.as_bytes()).unwrap();
        let card = &cards[0];
        assert_eq!(card.search_value("title"), Some("Pizza Place".into()));
        assert_eq!(card.search_value("address.country"), Some("Israel".into()));
        assert_eq!(card.search_value("address.zip"), Some("31000".into()));
        assert_eq!(card.search_value("address.state"), None);
        assert_eq!(card.search_value("bizNumber"), Some("1234567".into()));
        assert_eq!(card.search_value("unknown"), None);
    }

    #[test]
    fn test_blank_created_at_is_missing() {
        let card = Card::new("c1", "t").with_created_at("  ");
        assert!(card.created_at_raw().is_none());
    }

    #[test]
    fn test_toggle_like() {
        let mut card = Card::new("c1", "t").with_likes(["u2"]);
        assert!(card.toggle_like("u1"));
        assert!(card.is_liked_by("u1"));
        assert!(!card.toggle_like("u1"));
        assert!(!card.is_liked_by("u1"));
        assert_eq!(card.likes, vec!["u2".to_string()]);
    }

    #[test]
    fn test_set_liked_is_idempotent() {
        let mut card = Card::new("c1", "t");
        card.set_liked("u1", true);
        card.set_liked("u1", true);
        assert_eq!(card.likes, vec!["u1".to_string()]);
        card.set_liked("u1", false);
        assert!(card.likes.is_empty());
    }

    #[test]
    fn test_supports_key() {
        assert!(Card::supports_key("address.city"));
        assert!(!Card::supports_key("name.first"));
    }
}
