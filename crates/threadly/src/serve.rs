// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `threadly serve` and `threadly pull` command implementations.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use threadly_config::ThreadlyConfig;
use threadly_core::{StorageAdapter, ThreadlyError};
use threadly_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use threadly_threads::SignatureVerifier;
use tracing::{info, warn};

use crate::app;
use crate::shutdown;

/// Runs the gateway until SIGINT/SIGTERM, then drains in-flight continuations.
pub async fn run_serve(config: ThreadlyConfig) -> Result<(), ThreadlyError> {
    init_tracing(&config.log.level);
    info!("starting threadly serve");

    let app = app::build(&config).await?;

    if config.server.bearer_token.is_none() {
        warn!("server.bearer_token is not set -- operator API will reject every request");
    }

    let verifier = SignatureVerifier::new(
        SecretString::from(config.threads.app_secret.clone().unwrap_or_default()),
        SecretString::from(config.threads.verify_token.clone().unwrap_or_default()),
    );

    let state = GatewayState {
        pipeline: app.pipeline.clone(),
        verifier: Arc::new(verifier),
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: app.storage.clone(),
        },
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let cancel = shutdown::install_signal_handler();
    threadly_gateway::start_server(&server_config, state, cancel).await?;

    let drain = Duration::from_secs(config.server.shutdown_drain_secs);
    let in_flight = app.pipeline.in_flight();
    if in_flight > 0 {
        info!(in_flight, drain_secs = drain.as_secs(), "draining continuations");
    }
    if !app.pipeline.shutdown(drain).await {
        warn!(
            remaining = app.pipeline.in_flight(),
            "drain timed out; unfinished mentions stay in their last persisted state"
        );
    }

    app.storage.close().await?;
    info!("threadly serve shutdown complete");
    Ok(())
}

/// Runs one reconciliation pull and waits for the mentions it admitted.
pub async fn run_pull(config: ThreadlyConfig, account_id: &str) -> Result<(), ThreadlyError> {
    init_tracing(&config.log.level);

    let app = app::build(&config).await?;
    let report = app.pipeline.pull(account_id).await?;
    app.pipeline.settle().await;
    app.storage.close().await?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| ThreadlyError::Internal(format!("failed to render pull report: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("threadly={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
