// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threads Graph API request and response types.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Response to container creation and publish calls.
#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

/// Response to `refresh_access_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until the new token expires.
    pub expires_in: u64,
}

/// A single media object returned by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaObject {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub is_reply: Option<bool>,
    #[serde(default)]
    pub hide_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRef {
    pub id: String,
}

/// Paged list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaList {
    #[serde(default)]
    pub data: Vec<MediaObject>,
    #[serde(default)]
    pub paging: Option<serde_json::Value>,
}

/// Error body returned by the Graph API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// Parses a Threads timestamp (`2024-07-01T12:00:00+0000`), falling back to RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
