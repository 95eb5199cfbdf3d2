//! Authenticated session context
//!
//! The session is created once at login and handed to whatever needs it,
//! replacing ambient token lookups. Dropping it at logout invalidates every
//! borrowed use site by construction.

use core::fmt;

use crate::types::UserId;

// ----------------------------------------------------------------------------
// Auth Token
// ----------------------------------------------------------------------------

/// Bearer token issued by the backend at login.
///
/// The `Debug` impl redacts the secret so tokens never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token string
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    /// The raw secret, for embedding in an endpoint query
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(redacted)")
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// The logged-in user's identity and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    token: AuthToken,
}

impl Session {
    /// Create a session after a successful login
    pub fn new<T: Into<AuthToken>>(user_id: UserId, token: T) -> Self {
        Self {
            user_id,
            token: token.into(),
        }
    }

    /// The logged-in user's id
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The bearer token for authenticated endpoints
    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new(UserId::new(1), "top-secret");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_token_accessors() {
        let session = Session::new(UserId::new(5), "abc");
        assert_eq!(session.user_id(), UserId::new(5));
        assert_eq!(session.token().as_str(), "abc");
    }
}
