//! Connection targets

use super::Deployment;
use std::fmt;
use tether_core::{BearerToken, TokenShapeError};
use url::form_urlencoded::byte_serialize;
use url::Url;

/// Path of the socket endpoint
pub const SOCKET_PATH: &str = "/ws";

/// Why no target could be produced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("no bearer token")]
    MissingToken,

    #[error("malformed bearer token: {0}")]
    MalformedToken(#[from] TokenShapeError),
}

/// A resolved socket URI carrying the bearer token as a query parameter
///
/// Behind the dev proxy the URI is path-relative (`/ws?token=...`) and is
/// dialed against the proxy origin. `Display` and `Debug` redact the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    uri: String,
    path_start: usize,
    base: Option<Url>,
}

impl ConnectionTarget {
    /// Get the target URI as resolved
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Get the `/ws?token=...` part
    #[must_use]
    pub fn path(&self) -> &str {
        &self.uri[self.path_start..]
    }

    /// Check whether the target is relative to a proxy origin
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.base.is_some()
    }

    /// Get the absolute URL to dial
    ///
    /// # Errors
    /// Returns an error if the URI cannot be parsed as an absolute URL
    pub fn dial_url(&self) -> Result<Url, url::ParseError> {
        match &self.base {
            Some(origin) => origin.join(self.path()),
            None => Url::parse(&self.uri),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SOCKET_PATH}?token=***", &self.uri[..self.path_start])
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionTarget")
            .field(&format_args!("{self}"))
            .finish()
    }
}

/// Build the socket target for `token` in `deployment`
///
/// Missing, empty, and malformed tokens all yield an error.
///
/// # Errors
/// Returns an error if the token is absent or not a three-segment bearer token
pub fn resolve_target(
    token: Option<&str>,
    deployment: &Deployment,
) -> Result<ConnectionTarget, ResolveError> {
    let raw = token.ok_or(ResolveError::MissingToken)?;
    let token = BearerToken::parse(raw)?;
    let query: String = byte_serialize(token.as_str().as_bytes()).collect();

    let (prefix, base) = match deployment {
        Deployment::DevProxy { origin } => (String::new(), Some(origin.clone())),
        Deployment::Direct { .. } => (deployment.direct_origin().unwrap_or_default(), None),
    };

    Ok(ConnectionTarget {
        path_start: prefix.len(),
        uri: format!("{prefix}{SOCKET_PATH}?token={query}"),
        base,
    })
}
