//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use tact_core::{Config, SessionStore, TactPortal};

use crate::error::{ApiError, Result};
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub portal: Arc<TactPortal>,
}

impl AppState {
    pub fn new(config: Config, session: Arc<SessionStore>, portal: TactPortal) -> Self {
        Self {
            config,
            session,
            portal: Arc::new(portal),
        }
    }
}

/// Build the application router with middleware
pub fn app(state: AppState) -> Result<Router> {
    let cors = cors_layer(state.config.api.allowed_origins.as_deref())?;

    Ok(Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

fn cors_layer(allowed_origins: Option<&[String]>) -> Result<CorsLayer> {
    let Some(origins) = allowed_origins else {
        return Ok(CorsLayer::permissive());
    };

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| ApiError::Config(format!("Invalid CORS origin {}: {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Start the HTTP API server and run until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = state.config.api.port;
    let app = app(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
