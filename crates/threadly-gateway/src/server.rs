// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use threadly_core::{StorageAdapter, ThreadlyError};
use threadly_pipeline::MentionPipeline;
use threadly_threads::SignatureVerifier;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::webhook;

/// State behind the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    pub storage: Arc<dyn StorageAdapter>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<MentionPipeline>,
    /// Webhook handshake and signature checks.
    pub verifier: Arc<SignatureVerifier>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the full router.
///
/// - GET /health
/// - GET, POST /webhooks/threads
/// - GET /v1/accounts/{account_id}/mentions (auth)
/// - GET /v1/accounts/{account_id}/mentions/{mention_id} (auth)
/// - POST /v1/accounts/{account_id}/mentions/{mention_id}/retry (auth)
/// - POST /v1/accounts/{account_id}/sync (auth)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated: liveness and the platform's webhook (authenticated by signature).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhooks/threads",
            get(webhook::verify_subscription).post(webhook::receive_delivery),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/accounts/{account_id}/mentions",
            get(handlers::list_mentions),
        )
        .route(
            "/v1/accounts/{account_id}/mentions/{mention_id}",
            get(handlers::get_mention),
        )
        .route(
            "/v1/accounts/{account_id}/mentions/{mention_id}/retry",
            post(handlers::retry_mention),
        )
        .route("/v1/accounts/{account_id}/sync", post(handlers::sync_account))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` is cancelled.
///
/// Stops accepting connections on cancellation and returns once open
/// requests finish. Background continuations are not awaited here.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ThreadlyError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ThreadlyError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ThreadlyError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8080"));
    }
}
