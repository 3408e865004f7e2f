//! tact-core: TACT portal session bridge core library
//!
//! Session cookie lifecycle, the authenticated request layer and the
//! portal operations (sites, assignments, resources, announcements and
//! favorites) built on top of it.

pub mod client;
pub mod config;
pub mod error;
pub mod portal;
pub mod session;

pub use client::{PortalClient, PostResponse};
pub use config::{ApiConfig, Config, LoginConfig, PortalConfig, SessionConfig};
pub use error::{Error, Result};
pub use portal::{FavoriteSites, Record, Site, TactPortal};
pub use session::{CookieJar, CredentialAcquirer, SessionStatus, SessionStore};
