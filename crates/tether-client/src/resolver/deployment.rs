//! Deployment context

use std::fmt;
use std::net::Ipv6Addr;
use tether_common::{AppError, EndpointConfig};
use url::Url;

/// Where the socket server is reached from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    /// Development: a local proxy forwards `/ws` to the socket server, so
    /// targets are path-relative and resolved against the proxy origin
    DevProxy { origin: Url },
    /// Dial the socket server directly
    Direct {
        host: String,
        port: Option<u16>,
        /// Hosting origin is served over TLS
        tls: bool,
    },
}

impl Deployment {
    /// Create a direct deployment
    pub fn direct(host: impl Into<String>, port: Option<u16>, tls: bool) -> Self {
        Self::Direct {
            host: host.into(),
            port,
            tls,
        }
    }

    /// Create a dev-proxy deployment from an origin such as `http://localhost:5173`
    ///
    /// `http`/`https` origins are mapped onto `ws`/`wss`.
    ///
    /// # Errors
    /// Returns an error if the origin is not an absolute http(s) or ws(s) URL
    pub fn dev_proxy(origin: &str) -> Result<Self, AppError> {
        let mut url = Url::parse(origin).map_err(|e| AppError::endpoint(format!("{origin}: {e}")))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(AppError::endpoint(format!(
                    "unsupported proxy scheme `{other}`"
                )))
            }
        };
        if url.host_str().is_none() {
            return Err(AppError::endpoint("proxy origin has no host"));
        }
        url.set_scheme(scheme)
            .map_err(|()| AppError::endpoint(format!("cannot use scheme {scheme} for {origin}")))?;
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self::DevProxy { origin: url })
    }

    /// Build the deployment described by the endpoint configuration
    ///
    /// # Errors
    /// Returns an error if the proxy origin or host is unusable
    pub fn from_config(config: &EndpointConfig) -> Result<Self, AppError> {
        match &config.dev_proxy {
            Some(origin) => Self::dev_proxy(origin),
            None if config.host.trim().is_empty() => Err(AppError::endpoint("host is empty")),
            None => Ok(Self::direct(config.host.trim(), config.port, config.tls)),
        }
    }

    /// Get the socket scheme for direct dials
    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            Self::DevProxy { origin } => origin.scheme(),
            Self::Direct { tls: true, .. } => "wss",
            Self::Direct { tls: false, .. } => "ws",
        }
    }

    /// Get `scheme://host[:port]` for a direct deployment
    ///
    /// IPv6 literals are bracketed. `None` behind the dev proxy.
    #[must_use]
    pub fn direct_origin(&self) -> Option<String> {
        let Self::Direct { host, port, .. } = self else {
            return None;
        };

        let host = match host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{host}]"),
            Err(_) => host.clone(),
        };
        Some(match port {
            Some(port) => format!("{}://{host}:{port}", self.scheme()),
            None => format!("{}://{host}", self.scheme()),
        })
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DevProxy { origin } => write!(f, "dev proxy {origin}"),
            Self::Direct { .. } => f.write_str(&self.direct_origin().unwrap_or_default()),
        }
    }
}
