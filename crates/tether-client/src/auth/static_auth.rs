//! In-process authentication state

use parking_lot::RwLock;
use tether_common::CredentialsConfig;
use tether_core::{AuthProvider, AuthSnapshot};

/// Authentication state held in memory and updated by the host
///
/// The CLI seeds it from configuration; embedding applications update it
/// on sign-in and sign-out and then call `Consumer::refresh_auth`.
#[derive(Debug, Default)]
pub struct StaticAuth {
    snapshot: RwLock<AuthSnapshot>,
}

impl StaticAuth {
    #[must_use]
    pub fn new(snapshot: AuthSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Create a provider that is already signed in
    pub fn signed_in(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(AuthSnapshot::authenticated(identity, token))
    }

    /// Create a provider from configured credentials
    ///
    /// Counts as signed in only when both an identity and a token are set.
    #[must_use]
    pub fn from_credentials(credentials: &CredentialsConfig) -> Self {
        match (&credentials.identity, &credentials.token) {
            (Some(identity), Some(token)) => Self::signed_in(identity.clone(), token.clone()),
            _ => Self::default(),
        }
    }

    /// Replace the stored credentials
    pub fn sign_in(&self, identity: impl Into<String>, token: impl Into<String>) {
        *self.snapshot.write() = AuthSnapshot::authenticated(identity, token);
    }

    /// Forget the stored credentials
    pub fn sign_out(&self) {
        *self.snapshot.write() = AuthSnapshot::anonymous();
    }
}

impl AuthProvider for StaticAuth {
    fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.read().clone()
    }
}
