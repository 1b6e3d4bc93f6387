//! Explicit session handed to caches and coordinators
//!
//! The auth collaborator owns login and token storage. The engine only
//! needs to know who is acting and which opaque credential to forward to
//! the transport.

use std::fmt;

/// Opaque bearer credential, forwarded to the transport unchanged
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the transport to put on the wire
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub is_admin: bool,
    pub is_business: bool,
}

impl SessionUser {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
            is_business: false,
        }
    }

    /// Whether the user may create cards
    #[must_use]
    pub const fn can_create_cards(&self) -> bool {
        self.is_business || self.is_admin
    }
}

/// Current session: acting user plus credential
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
    token: Option<BearerToken>,
}

impl Session {
    /// Session with no signed-in user
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn authenticated(user: SessionUser, token: BearerToken) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
        }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }

    #[must_use]
    pub const fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_authenticated_session() {
        let session = Session::authenticated(SessionUser::new("u1"), BearerToken::new("secret"));
        assert_eq!(session.user_id(), Some("u1"));
        assert_eq!(session.token().map(BearerToken::expose), Some("secret"));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("secret");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_can_create_cards() {
        let mut user = SessionUser::new("u1");
        assert!(!user.can_create_cards());
        user.is_business = true;
        assert!(user.can_create_cards());
    }
}
