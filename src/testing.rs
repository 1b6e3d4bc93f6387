//! Testing utilities for bizdeck
//!
//! Fixture builders for cards, users, sessions and mock transports.
//!
//! Only available when compiled with `cfg(test)`.

use crate::model::{Address, Card, Entity, Name, User};
use crate::session::{BearerToken, Session, SessionUser};
use crate::transport::MockTransport;
use std::sync::Arc;

/// Credential a [`transport`] built for `user_id` accepts
#[must_use]
pub fn token_for(user_id: &str) -> String {
    format!("token-{user_id}")
}

/// Signed-in session for `user_id`
#[must_use]
pub fn session(user_id: &str) -> Session {
    Session::authenticated(SessionUser::new(user_id), BearerToken::new(token_for(user_id)))
}

/// Mock transport serving `records` and accepting the tokens of `users`
#[must_use]
pub fn transport<E: Entity>(records: Vec<E>, users: &[&str]) -> Arc<MockTransport<E>> {
    let transport = users.iter().fold(MockTransport::new(records), |transport, user| {
        transport.with_user_token(&token_for(user), user)
    });
    Arc::new(transport)
}

/// `count` cards with ids `card-1..=card-count`
///
/// Creation timestamps increase with the index, one minute apart.
#[must_use]
pub fn cards(count: usize) -> Vec<Card> {
    (1..=count)
        .map(|i| {
            let mut card = Card::new(format!("card-{i}"), format!("Card {i}"))
                .with_created_at(format!("2024-01-01T{:02}:{:02}:00Z", i / 60, i % 60));
            card.owner_id = Some("owner".into());
            card
        })
        .collect()
}

/// Card with a title, city and description for search tests
#[must_use]
pub fn business(id: &str, title: &str, city: &str, description: &str) -> Card {
    let mut card = Card::new(id, title);
    card.description = description.into();
    card.address = Address {
        city: city.into(),
        country: "Israel".into(),
        ..Address::default()
    };
    card
}

/// User with first and last name
#[must_use]
pub fn user(id: &str, first: &str, last: &str) -> User {
    User {
        id: Some(id.into()),
        name: Name {
            first: first.into(),
            middle: String::new(),
            last: last.into(),
        },
        email: format!("{}@example.com", first.to_lowercase()),
        ..User::default()
    }
}

/// Ids of `entities`, in order
#[must_use]
pub fn ids<'a, E: Entity>(entities: impl IntoIterator<Item = &'a E>) -> Vec<String> {
    entities
        .into_iter()
        .filter_map(|entity| entity.id().map(str::to_string))
        .collect()
}
