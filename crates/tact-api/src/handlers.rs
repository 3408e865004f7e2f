//! HTTP API handlers
//!
//! Thin wrappers over the portal operations. Any unrecovered error becomes
//! a 500 with the error text in `detail`.

use std::fmt::Display;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{error, info};

use tact_core::{Record, SessionStatus, Site};

use crate::server::AppState;

// ============================================================================
// Response types
// ============================================================================

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of a favorite toggle
#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub site_id: String,
    pub favorite: bool,
    pub success: bool,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn internal_error(context: &str, e: impl Display) -> (StatusCode, Json<ErrorResponse>) {
    error!("{} failed: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
}

// ============================================================================
// Handler functions
// ============================================================================

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to TACT Unofficial API".to_string(),
    })
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Run the interactive browser login
pub async fn login(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state
        .session
        .authenticate(state.config.login.headless)
        .await
        .map_err(|e| internal_error("Login", e))?;

    info!("Login via API succeeded");
    Ok(Json(MessageResponse {
        message: "Login successful".to_string(),
    }))
}

pub async fn auth_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

pub async fn sites(State(state): State<AppState>) -> ApiResult<Vec<Site>> {
    let sites = state
        .portal
        .list_sites()
        .await
        .map_err(|e| internal_error("Listing sites", e))?;
    Ok(Json(sites))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Json<FavoriteResponse> {
    let success = state.portal.add_favorite(&site_id).await;
    Json(FavoriteResponse {
        site_id,
        favorite: true,
        success,
    })
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Json<FavoriteResponse> {
    let success = state.portal.remove_favorite(&site_id).await;
    Json(FavoriteResponse {
        site_id,
        favorite: false,
        success,
    })
}

pub async fn resources(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> ApiResult<Vec<Record>> {
    let resources = state
        .portal
        .list_resources(&site_id)
        .await
        .map_err(|e| internal_error("Listing resources", e))?;
    Ok(Json(resources))
}

pub async fn assignments(State(state): State<AppState>) -> ApiResult<Vec<Record>> {
    let assignments = state
        .portal
        .list_assignments()
        .await
        .map_err(|e| internal_error("Listing assignments", e))?;
    Ok(Json(assignments))
}

pub async fn announcements(State(state): State<AppState>) -> ApiResult<Vec<Record>> {
    let announcements = state
        .portal
        .list_announcements()
        .await
        .map_err(|e| internal_error("Listing announcements", e))?;
    Ok(Json(announcements))
}
