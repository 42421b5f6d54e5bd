// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Threads Graph API.
//!
//! Access tokens travel as query parameters, so request URLs are never
//! logged. Transient failures (429, 500, 503) are retried once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use threadly_core::ThreadlyError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, IdResponse, MediaList, RefreshResponse};

const REPLY_FIELDS: &str =
    "id,text,timestamp,media_type,media_url,permalink,username,is_reply,hide_status";
const POST_FIELDS: &str = "id,text,timestamp,media_type,permalink,username";

/// Graph API client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ThreadsClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl ThreadsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ThreadlyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ThreadlyError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the pause before a retry (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Creates a TEXT reply container under `user_id`, then publishes it.
    ///
    /// Returns the published media id and the raw publish body.
    pub async fn create_reply(
        &self,
        token: &SecretString,
        user_id: &str,
        text: &str,
        reply_to_id: &str,
    ) -> Result<(String, serde_json::Value), ThreadlyError> {
        let container: IdResponse = self
            .call(
                Method::POST,
                &format!("{user_id}/threads"),
                &[
                    ("media_type", "TEXT"),
                    ("text", text),
                    ("reply_to_id", reply_to_id),
                    ("access_token", token.expose_secret()),
                ],
            )
            .await?;
        debug!(container_id = %container.id, "reply container created");

        let raw: serde_json::Value = self
            .call(
                Method::POST,
                &format!("{user_id}/threads_publish"),
                &[
                    ("creation_id", container.id.as_str()),
                    ("access_token", token.expose_secret()),
                ],
            )
            .await?;
        let published: IdResponse =
            serde_json::from_value(raw.clone()).map_err(|e| ThreadlyError::Platform {
                message: format!("publish response missing id: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok((published.id, raw))
    }

    /// Lists the user's own posts created at or after `since`.
    pub async fn user_threads(
        &self,
        token: &SecretString,
        user_id: &str,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<MediaList, ThreadlyError> {
        let limit = limit.to_string();
        let since = since.timestamp().to_string();
        self.call(
            Method::GET,
            &format!("{user_id}/threads"),
            &[
                ("fields", POST_FIELDS),
                ("limit", limit.as_str()),
                ("since", since.as_str()),
                ("access_token", token.expose_secret()),
            ],
        )
        .await
    }

    /// Lists replies to `media_id`, oldest first.
    pub async fn replies(
        &self,
        token: &SecretString,
        media_id: &str,
    ) -> Result<MediaList, ThreadlyError> {
        self.call(
            Method::GET,
            &format!("{media_id}/replies"),
            &[
                ("fields", REPLY_FIELDS),
                ("reverse", "true"),
                ("access_token", token.expose_secret()),
            ],
        )
        .await
    }

    /// Exchanges a long-lived token for a fresh one.
    pub async fn refresh_access_token(
        &self,
        token: &SecretString,
    ) -> Result<RefreshResponse, ThreadlyError> {
        self.call(
            Method::GET,
            "refresh_access_token",
            &[
                ("grant_type", "th_refresh_token"),
                ("access_token", token.expose_secret()),
            ],
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ThreadlyError> {
        let url = Url::parse_with_params(&format!("{}/{path}", self.base_url), params).map_err(
            |e| ThreadlyError::Platform {
                message: format!("invalid request URL for {path}: {e}"),
                source: Some(Box::new(e)),
            },
        )?;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying Threads request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .request(method.clone(), url.clone())
                .send()
                .await
                .map_err(|e| ThreadlyError::Platform {
                    message: format!("HTTP request to {path} failed: {}", e.without_url()),
                    source: None,
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "Threads response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| ThreadlyError::Platform {
                    message: format!("failed to read response body: {}", e.without_url()),
                    source: None,
                })?;
                return serde_json::from_str(&body).map_err(|e| ThreadlyError::Platform {
                    message: format!("failed to parse Threads response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = ThreadlyError::Platform {
                message: describe_error(status, &body),
                source: None,
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, path, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| ThreadlyError::Platform {
            message: format!("request to {path} failed after retries"),
            source: None,
        }))
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "threads API error: {} (code: {})",
            api_err.error.message, api_err.error.code
        ),
        Err(_) => format!("threads API returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
