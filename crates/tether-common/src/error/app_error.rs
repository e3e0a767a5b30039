//! Application error types
//!
//! Errors that can stop the process at startup. Connection failures never
//! appear here; they are delivered to subscribers as advisory callbacks.

use crate::config::ConfigError;
use crate::telemetry::TracingError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Telemetry errors
    #[error("Telemetry error: {0}")]
    Tracing(#[from] TracingError),

    // Invalid endpoint (bad proxy origin, host, etc.)
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    // OS-level errors (signal handlers, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Endpoint(_) => "ENDPOINT_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Create an endpoint error
    #[must_use]
    pub fn endpoint(msg: impl std::fmt::Display) -> Self {
        Self::Endpoint(msg.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
