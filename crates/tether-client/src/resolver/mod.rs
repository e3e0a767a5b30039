//! Connection target resolution
//!
//! Turns the current credentials and deployment into the URI the manager
//! dials. Resolution happens at every dial so a refreshed token is picked
//! up by the next reconnect.

mod deployment;
mod target;

pub use deployment::Deployment;
pub use target::{resolve_target, ConnectionTarget, ResolveError, SOCKET_PATH};

use std::sync::Arc;
use tether_core::AuthProvider;

/// Resolves targets from a deployment and an authentication collaborator
#[derive(Clone)]
pub struct UriResolver {
    deployment: Deployment,
    auth: Arc<dyn AuthProvider>,
}

impl UriResolver {
    #[must_use]
    pub fn new(deployment: Deployment, auth: Arc<dyn AuthProvider>) -> Self {
        Self { deployment, auth }
    }

    /// Get the deployment this resolver targets
    #[must_use]
    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Resolve the target for the current credentials
    ///
    /// # Errors
    /// Returns an error if nobody is signed in or the token is missing or
    /// malformed. All three mean "no target": the manager reports a
    /// configuration error and does not dial.
    pub fn resolve(&self) -> Result<ConnectionTarget, ResolveError> {
        let snapshot = self.auth.snapshot();
        if !snapshot.is_authenticated {
            return Err(ResolveError::NotAuthenticated);
        }
        resolve_target(snapshot.token.as_deref(), &self.deployment)
    }
}

impl std::fmt::Debug for UriResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriResolver")
            .field("deployment", &self.deployment)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;
    use tether_core::AuthSnapshot;

    #[test]
    fn test_resolves_from_current_credentials() {
        let auth = Arc::new(StaticAuth::signed_in("user-1", "a.b.c"));
        let resolver = UriResolver::new(Deployment::direct("localhost", Some(8080), false), auth.clone());

        let target = resolver.resolve().unwrap();
        assert_eq!(target.as_str(), "ws://localhost:8080/ws?token=a.b.c");

        // A refreshed token is used by the next resolution
        auth.sign_in("user-1", "x.y.z");
        let target = resolver.resolve().unwrap();
        assert_eq!(target.path(), "/ws?token=x.y.z");
    }

    #[test]
    fn test_unauthenticated_has_no_target() {
        let auth = Arc::new(StaticAuth::new(AuthSnapshot {
            is_authenticated: false,
            identity: None,
            token: Some("a.b.c".to_string()),
        }));
        let resolver = UriResolver::new(Deployment::direct("localhost", None, false), auth);

        assert!(matches!(resolver.resolve(), Err(ResolveError::NotAuthenticated)));
    }

    #[test]
    fn test_malformed_token_has_no_target() {
        let auth = Arc::new(StaticAuth::signed_in("user-1", "abc"));
        let resolver = UriResolver::new(Deployment::direct("localhost", None, false), auth);

        assert!(matches!(resolver.resolve(), Err(ResolveError::MalformedToken(_))));
    }
}
