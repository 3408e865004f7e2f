//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    add_favorite, announcements, assignments, auth_status, health, login, remove_favorite,
    resources, root, sites,
};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Session
        .route("/auth/login", post(login))
        .route("/auth/status", get(auth_status))
        // Portal data
        .route("/sites", get(sites))
        .route(
            "/sites/{site_id}/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/sites/{site_id}/resources", get(resources))
        .route("/assignments", get(assignments))
        .route("/announcements", get(announcements))
}
