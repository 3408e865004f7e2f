//! tact-api: HTTP API for the TACT portal bridge
//!
//! Exposes login, session status, sites, favorites, assignments,
//! resources and announcements as JSON endpoints. Built with axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, start_server};
