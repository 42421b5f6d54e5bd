// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threads webhook endpoint.
//!
//! The handshake echoes `hub.challenge` when the verify token matches.
//! Deliveries are authenticated against the raw body, admitted synchronously,
//! and acknowledged before any mention is processed.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use threadly_threads::{extract_mentions, parse_payload};
use tracing::{debug, error, info, warn};

use crate::handlers::ApiError;
use crate::server::GatewayState;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Handshake query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// GET /webhooks/threads
pub async fn verify_subscription(
    State(state): State<GatewayState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    let (Some(mode), Some(token), Some(challenge)) = (
        non_empty(&query.mode),
        non_empty(&query.verify_token),
        non_empty(&query.challenge),
    ) else {
        warn!("webhook verification missing parameters");
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "MISSING_PARAMS",
            "missing verification parameters",
        )
        .into_response();
    };

    match state.verifier.verify_challenge(mode, token, challenge) {
        Some(echo) => {
            info!("webhook subscription verified");
            (StatusCode::OK, echo).into_response()
        }
        None => {
            warn!(mode, "webhook verification failed");
            ApiError::new(
                StatusCode::FORBIDDEN,
                "VERIFICATION_FAILED",
                "invalid verify token",
            )
            .into_response()
        }
    }
}

/// POST /webhooks/threads
///
/// 401 on a missing or bad signature, 400 on a malformed envelope, 500 when
/// admission cannot reach storage, otherwise 200.
pub async fn receive_delivery(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        warn!("webhook delivery without signature");
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "MISSING_SIGNATURE",
            "missing signature header",
        )
        .into_response();
    };

    if !state.verifier.verify_signature(&body, signature) {
        warn!("webhook delivery with invalid signature");
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_SIGNATURE",
            "invalid signature",
        )
        .into_response();
    }

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "rejecting webhook delivery");
            return ApiError::new(StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", e.to_string())
                .into_response();
        }
    };

    let events = extract_mentions(&payload);
    debug!(object = %payload.object, mentions = events.len(), "webhook delivery accepted");
    if events.is_empty() {
        return StatusCode::OK.into_response();
    }

    match state.pipeline.ingest_events(events).await {
        Ok(outcomes) => {
            debug!(outcomes = outcomes.len(), "webhook mentions submitted");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            error!(error = %e, "webhook admission failed");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ADMISSION_FAILED",
                "failed to record mentions",
            )
            .into_response()
        }
    }
}
