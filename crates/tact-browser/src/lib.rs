//! tact-browser: Interactive portal login for tact-gateway
//!
//! Drives a Chrome window to the portal login page and waits until the
//! user has signed in (including any MFA step), then hands the session
//! cookies to the core session store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tact_browser::BrowserLogin;
//! use tact_core::{Config, SessionStore};
//!
//! let config = Config::load()?;
//! let session = SessionStore::open(&config.session.cookie_file)
//!     .with_acquirer(Arc::new(BrowserLogin::from_config(&config)));
//!
//! session.authenticate(false).await?;
//! ```

pub mod error;
pub mod login;
pub mod session;

pub use error::{BrowserError, Result};
pub use login::{BrowserLogin, is_login_complete};
pub use session::{BrowserConfig, BrowserConfigBuilder, BrowserSession};
