// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use innkeep_automation::PropertyClock;
use innkeep_bus::EventBus;
use innkeep_core::InnkeepError;
use innkeep_storage::database::Database;
use innkeep_storage::FsBlobStore;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Single-writer database handle.
    pub db: Arc<Database>,
    /// Bus for publishing events after durable writes.
    pub bus: EventBus,
    /// Property-local time math for forced re-evaluation.
    pub clock: Arc<PropertyClock>,
    /// Local store that re-hosts expiring provider attachment URLs.
    pub blobs: Arc<FsBlobStore>,
    /// Client for fetching provider-hosted attachments.
    pub http: reqwest::Client,
}

/// Gateway server configuration (mirrors `GatewayConfig` from innkeep-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub bind_address: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for auth (None rejects everything).
    pub bearer_token: Option<String>,
}

/// Assemble the gateway router.
///
/// `/health` is public; everything under `/v1` goes through the bearer
/// middleware.
pub fn build_router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let api_routes = Router::new()
        .route("/v1/webhooks/{provider}", post(handlers::post_webhook))
        .route(
            "/v1/reservations/{id}/automation/trigger",
            post(handlers::post_trigger),
        )
        .route(
            "/v1/reservations/{id}/automation/cancel",
            post(handlers::post_cancel),
        )
        .route("/v1/reservations/{id}/scheduled", get(handlers::get_scheduled))
        .route("/v1/threads/{id}/unread", get(handlers::get_thread_unread))
        .route("/v1/unread", get(handlers::get_unread))
        .route("/v1/messages/{id}/read", post(handlers::post_mark_read))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server; returns once `cancel` fires and
/// in-flight requests have drained.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), InnkeepError> {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };
    let app = build_router(state, auth);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| InnkeepError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| InnkeepError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
