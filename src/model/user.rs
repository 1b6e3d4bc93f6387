//! User record, as listed on the admin screen

use super::{Address, Entity, EntityKind, Image, non_empty};
use serde::{Deserialize, Serialize};

const USER_SEARCH_KEYS: &[&str] = &[
    "name.first",
    "name.middle",
    "name.last",
    "email",
    "phone",
    "address.state",
    "address.country",
    "address.city",
    "address.street",
    "address.houseNumber",
    "address.zip",
];

/// Name parts of a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub middle: String,
    #[serde(default)]
    pub last: String,
}

impl Name {
    /// "First Middle Last", skipping a blank middle name
    #[must_use]
    pub fn full(&self) -> String {
        [&self.first, &self.middle, &self.last]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A registered user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Name,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub image: Image,

    #[serde(default)]
    pub address: Address,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub is_business: bool,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn likes(&self) -> &[String] {
        &[]
    }

    fn likes_mut(&mut self) -> Option<&mut Vec<String>> {
        None
    }

    fn created_at_raw(&self) -> Option<&str> {
        self.created_at.as_deref().filter(|raw| !raw.trim().is_empty())
    }

    fn search_value(&self, key: &str) -> Option<String> {
        match key {
            "name.first" => non_empty(&self.name.first),
            "name.middle" => non_empty(&self.name.middle),
            "name.last" => non_empty(&self.name.last),
            "email" => non_empty(&self.email),
            "phone" => non_empty(&self.phone),
            _ => key
                .strip_prefix("address.")
                .and_then(|field| self.address.search_value(field)),
        }
    }

    fn default_search_keys() -> &'static [&'static str] {
        USER_SEARCH_KEYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decode_entities;

    #[test]
    fn test_decode_user() {
        let json = br#"[{
            "_id": "u1",
            "name": { "first": "Dana", "middle": "", "last": "Levi" },
            "email": "dana@example.com",
            "phone": "052-0000000",
            "isAdmin": true,
            "isBusiness": false
        }]"#;
        let users: Vec<User> = decode_entities(json).unwrap();
        let user = &users[0];

        assert_eq!(user.id(), Some("u1"));
        assert!(user.is_admin);
        assert_eq!(user.name.full(), "Dana Levi");
        assert_eq!(user.search_value("name.last"), Some("Levi".into()));
        assert_eq!(user.search_value("name.middle"), None);
    }

    #[test]
    fn test_user_has_no_likes() {
        let mut user = User {
            id: Some("u1".into()),
            ..User::default()
        };
        assert!(user.likes().is_empty());
        assert!(!user.toggle_like("u2"));
        assert!(user.likes().is_empty());
    }
}
