//! Flat form values to nested records
//!
//! Create and edit screens collect flat values; the remote service expects
//! nested `image` / `address` / `name` objects. Optional text becomes an
//! empty string and optional numbers become 0.

use super::{Address, Card, Image, Name, User};
use serde::{Deserialize, Serialize};

/// Values collected by the new-card and edit-card forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardForm {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub web: Option<String>,
    pub url: Option<String>,
    pub alt: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: Option<u32>,
    pub zip: Option<u64>,
}

impl CardForm {
    /// Build the card payload sent to the remote service
    #[must_use]
    pub fn normalize(self) -> Card {
        Card {
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            phone: self.phone,
            email: self.email,
            web: self.web.filter(|web| !web.trim().is_empty()),
            image: Image {
                url: self.url.unwrap_or_default(),
                alt: self.alt.unwrap_or_default(),
            },
            address: Address {
                state: self.state.unwrap_or_default(),
                country: self.country,
                city: self.city,
                street: self.street,
                house_number: self.house_number.unwrap_or(0),
                zip: self.zip.unwrap_or(0),
            },
            ..Card::default()
        }
    }

    /// Pre-fill the form from an existing card (edit screen)
    #[must_use]
    pub fn from_card(card: &Card) -> Self {
        Self {
            title: card.title.clone(),
            subtitle: card.subtitle.clone(),
            description: card.description.clone(),
            phone: card.phone.clone(),
            email: card.email.clone(),
            web: card.web.clone(),
            url: Some(card.image.url.clone()),
            alt: Some(card.image.alt.clone()),
            state: Some(card.address.state.clone()),
            country: card.address.country.clone(),
            city: card.address.city.clone(),
            street: card.address.street.clone(),
            house_number: Some(card.address.house_number),
            zip: Some(card.address.zip),
        }
    }
}

/// Values collected by the register and edit-profile forms
///
/// Credentials are handled by the auth collaborator and are not part of
/// this form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub first: String,
    pub middle: Option<String>,
    pub last: String,
    pub phone: String,
    pub email: String,
    pub url: Option<String>,
    pub alt: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: Option<u32>,
    pub zip: Option<u64>,
    pub is_business: bool,
}

impl UserForm {
    /// Build the user payload sent to the remote service
    #[must_use]
    pub fn normalize(self) -> User {
        User {
            name: Name {
                first: self.first,
                middle: self.middle.unwrap_or_default(),
                last: self.last,
            },
            phone: self.phone,
            email: self.email,
            image: Image {
                url: self.url.unwrap_or_default(),
                alt: self.alt.unwrap_or_default(),
            },
            address: Address {
                state: self.state.unwrap_or_default(),
                country: self.country,
                city: self.city,
                street: self.street,
                house_number: self.house_number.unwrap_or(0),
                zip: self.zip.unwrap_or(0),
            },
            is_business: self.is_business,
            ..User::default()
        }
    }
}
