//! Error types for tact-browser

use std::time::Duration;

use thiserror::Error;

/// tact-browser error type
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Tab error: {0}")]
    TabError(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Login not completed within {0:?}")]
    Timeout(Duration),
}

impl From<BrowserError> for tact_core::Error {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Timeout(waited) => tact_core::Error::AuthTimeout(waited),
            other => tact_core::Error::Auth(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BrowserError>;
