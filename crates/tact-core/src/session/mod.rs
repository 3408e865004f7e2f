//! Session management module
//!
//! Holds the authenticated cookie state for the process and persists it
//! between runs.

mod acquirer;
mod store;
mod types;

pub use acquirer::CredentialAcquirer;
pub use store::{SessionStatus, SessionStore};
pub use types::CookieJar;
