//! Credential acquisition seam
//!
//! The interactive sign-in lives outside this crate (see `tact-browser`).
//! The session store only needs something that eventually hands back a
//! cookie jar.

use async_trait::async_trait;

use crate::Result;
use crate::session::CookieJar;

/// Performs an interactive portal login and returns the resulting cookies.
///
/// Implementations may block for a human-timescale duration but must give
/// up with [`crate::Error::AuthTimeout`] once their deadline passes and
/// release whatever automation resources they opened.
#[async_trait]
pub trait CredentialAcquirer: Send + Sync {
    /// Run the login flow
    ///
    /// # Arguments
    /// * `headless` - hide the browser window
    async fn acquire(&self, headless: bool) -> Result<CookieJar>;
}
