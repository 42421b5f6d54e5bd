// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Threadly mention pipeline.
//!
//! Serves three surfaces from one axum router:
//!
//! - `GET`/`POST /webhooks/threads` - subscription handshake and signed deliveries
//! - `GET /health` - unauthenticated liveness with storage health and uptime
//! - `/v1/accounts/{account_id}/...` - bearer-authenticated operator routes
//!   for listing, inspecting, retrying and syncing mentions

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
