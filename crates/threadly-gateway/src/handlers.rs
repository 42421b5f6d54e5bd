// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health and operator API handlers.
//!
//! Successful responses are wrapped as `{"success": true, "data": ...}`,
//! failures as `{"success": false, "error": {"code", "message"}}`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use threadly_core::{HealthStatus, Mention, MentionStatus, ThreadlyError};

use crate::server::GatewayState;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

/// A handler failure mapped to an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<ThreadlyError> for ApiError {
    fn from(err: ThreadlyError) -> Self {
        match &err {
            ThreadlyError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            ThreadlyError::Forbidden(_) => {
                Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "access denied")
            }
            ThreadlyError::InvalidState(_) => {
                Self::new(StatusCode::CONFLICT, "INVALID_STATE", err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "operator request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    err.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
///
/// 503 when storage reports unhealthy or the check itself fails.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, storage, code) = match state.health.storage.health_check().await {
        Ok(HealthStatus::Healthy) => ("ok", "healthy".to_string(), StatusCode::OK),
        Ok(HealthStatus::Degraded(why)) => ("degraded", why, StatusCode::OK),
        Ok(HealthStatus::Unhealthy(why)) => ("unavailable", why, StatusCode::SERVICE_UNAVAILABLE),
        Err(e) => (
            "unavailable",
            e.to_string(),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    };

    let body = HealthResponse {
        status: status.to_string(),
        storage,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    };
    (code, Json(body)).into_response()
}

/// Query parameters for the mention listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListQuery {
    /// `(limit, offset)` with the page size clamped to `1..=100`.
    pub fn page(&self) -> (u32, u32) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).clamp(0, i64::from(u32::MAX));
        (limit as u32, offset as u32)
    }

    fn status(&self) -> Result<Option<MentionStatus>, ApiError> {
        match self.status.as_deref().filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_STATUS",
                    format!("unknown mention status: {raw}"),
                )
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub limit: u32,
    pub offset: u32,
}

/// GET /v1/accounts/{account_id}/mentions
pub async fn list_mentions(
    State(state): State<GatewayState>,
    Path(account_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Paginated<Mention>>>, ApiError> {
    let (limit, offset) = query.page();
    let status = query.status()?;
    let items = state
        .pipeline
        .list_mentions(&account_id, limit, offset, status)
        .await?;
    Ok(ApiResponse::ok(Paginated {
        items,
        limit,
        offset,
    }))
}

/// GET /v1/accounts/{account_id}/mentions/{mention_id}
pub async fn get_mention(
    State(state): State<GatewayState>,
    Path((account_id, mention_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Mention>>, ApiError> {
    let mention = state.pipeline.get_mention(&account_id, &mention_id).await?;
    Ok(ApiResponse::ok(mention))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /v1/accounts/{account_id}/mentions/{mention_id}/retry
///
/// Returns once the reprocessing is scheduled, not when it finishes.
pub async fn retry_mention(
    State(state): State<GatewayState>,
    Path((account_id, mention_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.pipeline.retry(&account_id, &mention_id).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "retry initiated".to_string(),
    }))
}

/// POST /v1/accounts/{account_id}/sync
pub async fn sync_account(
    State(state): State<GatewayState>,
    Path(account_id): Path<String>,
) -> Result<Json<ApiResponse<threadly_pipeline::PullReport>>, ApiError> {
    let report = state.pipeline.pull(&account_id).await?;
    Ok(ApiResponse::ok(report))
}
