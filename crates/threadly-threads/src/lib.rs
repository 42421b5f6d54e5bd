// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threads platform adapter for Threadly.
//!
//! Verifies and parses inbound webhooks, and implements
//! [`PlatformAdapter`] over the Graph API for reply delivery, reconciliation
//! listing and token refresh.

pub mod client;
pub mod signature;
pub mod types;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use threadly_config::model::ThreadsConfig;
use threadly_core::{
    PlatformAdapter, PlatformPost, PlatformReply, PublishedReply, RefreshedToken, ThreadlyError,
};
use tracing::debug;

pub use client::ThreadsClient;
pub use signature::SignatureVerifier;
pub use webhook::{WebhookPayload, extract_mentions, parse_payload};

use crate::types::{MediaObject, parse_timestamp};

/// Threads implementation of [`PlatformAdapter`].
pub struct ThreadsPlatform {
    client: ThreadsClient,
}

impl ThreadsPlatform {
    pub fn new(config: &ThreadsConfig) -> Result<Self, ThreadlyError> {
        let client = ThreadsClient::new(
            config.graph_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { client })
    }

    pub fn from_client(client: ThreadsClient) -> Self {
        Self { client }
    }
}

fn to_post(media: MediaObject) -> PlatformPost {
    PlatformPost {
        timestamp: media.timestamp.as_deref().and_then(parse_timestamp),
        id: media.id,
        text: media.text,
        username: media.username,
    }
}

fn to_reply(media: MediaObject) -> Option<PlatformReply> {
    let Some(username) = media.username else {
        debug!(reply_id = %media.id, "skipping reply without username");
        return None;
    };
    Some(PlatformReply {
        timestamp: media.timestamp.as_deref().and_then(parse_timestamp),
        user_id: media.owner.map(|o| o.id),
        media_urls: media.media_url.into_iter().collect(),
        id: media.id,
        text: media.text,
        username,
    })
}

#[async_trait]
impl PlatformAdapter for ThreadsPlatform {
    async fn create_reply(
        &self,
        token: &SecretString,
        account_platform_id: &str,
        text: &str,
        in_reply_to: &str,
    ) -> Result<PublishedReply, ThreadlyError> {
        let (id, raw) = self
            .client
            .create_reply(token, account_platform_id, text, in_reply_to)
            .await?;
        Ok(PublishedReply { id, raw })
    }

    async fn list_own_posts(
        &self,
        token: &SecretString,
        account_platform_id: &str,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PlatformPost>, ThreadlyError> {
        let list = self
            .client
            .user_threads(token, account_platform_id, since, limit)
            .await?;
        Ok(list.data.into_iter().take(limit as usize).map(to_post).collect())
    }

    async fn list_replies(
        &self,
        token: &SecretString,
        post_id: &str,
    ) -> Result<Vec<PlatformReply>, ThreadlyError> {
        let list = self.client.replies(token, post_id).await?;
        Ok(list.data.into_iter().filter_map(to_reply).collect())
    }

    async fn refresh_token(&self, token: &SecretString) -> Result<RefreshedToken, ThreadlyError> {
        let refreshed = self.client.refresh_access_token(token).await?;
        Ok(RefreshedToken {
            access_token: SecretString::from(refreshed.access_token),
            expires_in: Duration::from_secs(refreshed.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn platform(uri: &str) -> ThreadsPlatform {
        let config = ThreadsConfig {
            graph_base_url: uri.to_string(),
            timeout_secs: 5,
            ..ThreadsConfig::default()
        };
        ThreadsPlatform::new(&config).unwrap()
    }

    #[tokio::test]
    async fn list_replies_maps_and_drops_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post-1/replies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": "r1", "text": "first", "username": "bob", "timestamp": "2024-07-01T12:00:00+0000"},
                    {"id": "r2", "text": "hidden author"},
                    {"id": "r3", "text": "third", "username": "eve", "owner": {"id": "u-3"}}
                ]
            })))
            .mount(&server)
            .await;

        let replies = platform(&server.uri())
            .list_replies(&SecretString::from("t"), "post-1")
            .await
            .unwrap();
        let ids: Vec<_> = replies.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
        assert!(replies[0].timestamp.is_some());
        assert_eq!(replies[1].user_id.as_deref(), Some("u-3"));
    }

    #[tokio::test]
    async fn refresh_converts_expiry_to_duration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/refresh_access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh", "expires_in": 60
            })))
            .mount(&server)
            .await;

        let refreshed = platform(&server.uri())
            .refresh_token(&SecretString::from("old"))
            .await
            .unwrap();
        assert_eq!(refreshed.expires_in, Duration::from_secs(60));
    }
}
