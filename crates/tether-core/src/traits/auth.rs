//! Authentication port
//!
//! The socket layer never authenticates anyone itself. It asks an
//! `AuthProvider` for the current identity and bearer token each time it
//! needs to dial.

use crate::value_objects::BearerToken;

/// Point-in-time view of the authentication collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Whether the collaborator considers the user signed in
    pub is_authenticated: bool,
    /// Identity id (user id)
    pub identity: Option<String>,
    /// Raw bearer token
    pub token: Option<String>,
}

impl AuthSnapshot {
    /// Create an authenticated snapshot
    pub fn authenticated(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            identity: Some(identity.into()),
            token: Some(token.into()),
        }
    }

    /// Create an unauthenticated snapshot
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Check for a signed-in user with a non-empty identity
    ///
    /// Token shape is not considered here; the resolver rejects malformed
    /// tokens separately.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.is_authenticated && self.identity.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Get the bearer token if it is present and well-formed
    #[must_use]
    pub fn bearer_token(&self) -> Option<BearerToken> {
        self.token
            .as_deref()
            .and_then(|raw| BearerToken::parse(raw).ok())
    }
}

/// Supplies authentication state to the connection layer
pub trait AuthProvider: Send + Sync {
    /// Get the current authentication state
    fn snapshot(&self) -> AuthSnapshot;
}
