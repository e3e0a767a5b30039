//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tether_core::BackoffPolicy;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub endpoint: EndpointConfig,
    pub reconnect: ReconnectConfig,
    pub timeouts: TimeoutConfig,
    pub credentials: CredentialsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Where the socket server lives
///
/// When `dev_proxy` is set the client dials through the development proxy
/// using a path-relative target; otherwise it dials `host[:port]` directly.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Origin of the development proxy, e.g. `http://localhost:5173`
    #[serde(default)]
    pub dev_proxy: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether the hosting origin is served over TLS (selects `wss`)
    #[serde(default)]
    pub tls: bool,
}

/// Reconnect policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl ReconnectConfig {
    #[must_use]
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(self.base_interval_ms), self.max_attempts)
    }
}

/// Timer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl TimeoutConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// Static credentials for headless use (the CLI)
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("identity", &self.identity)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

// Default value functions
fn default_app_name() -> String {
    "tether".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_base_interval_ms() -> u64 {
    3_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            app: AppSettings {
                name: non_empty("APP_NAME").unwrap_or_else(default_app_name),
                env: non_empty("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            endpoint: EndpointConfig {
                dev_proxy: non_empty("TETHER_DEV_PROXY"),
                host: non_empty("TETHER_HOST").unwrap_or_else(default_host),
                port: parse_var(&lookup, "TETHER_PORT")?,
                tls: parse_bool(&lookup, "TETHER_TLS")?.unwrap_or(false),
            },
            reconnect: ReconnectConfig {
                base_interval_ms: parse_var(&lookup, "TETHER_RECONNECT_BASE_MS")?
                    .unwrap_or_else(default_base_interval_ms),
                max_attempts: parse_var(&lookup, "TETHER_RECONNECT_MAX_ATTEMPTS")?
                    .unwrap_or_else(default_max_attempts),
            },
            timeouts: TimeoutConfig {
                connect_timeout_ms: parse_var(&lookup, "TETHER_CONNECT_TIMEOUT_MS")?
                    .unwrap_or_else(default_connect_timeout_ms),
                heartbeat_interval_ms: parse_var(&lookup, "TETHER_HEARTBEAT_INTERVAL_MS")?
                    .unwrap_or_else(default_heartbeat_interval_ms),
            },
            credentials: CredentialsConfig {
                identity: non_empty("TETHER_IDENTITY"),
                token: non_empty("TETHER_TOKEN"),
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        _ => Ok(None),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match lookup(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(key, raw)),
        },
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
