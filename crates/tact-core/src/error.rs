//! Error types for tact-core

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for tact-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Login timed out after {0:?} without returning to the portal")]
    AuthTimeout(Duration),

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {path}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to persist cookies to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cookie file: {0}")]
    CorruptState(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the network or an upstream HTTP status
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

/// Result type alias for tact-core
pub type Result<T> = std::result::Result<T, Error>;
