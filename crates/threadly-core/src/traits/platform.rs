// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform adapter trait for the social network's API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::error::ThreadlyError;
use crate::types::{PlatformPost, PlatformReply, PublishedReply, RefreshedToken};

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Publishes `text` as a reply to `in_reply_to` on behalf of the account.
    async fn create_reply(
        &self,
        token: &SecretString,
        account_platform_id: &str,
        text: &str,
        in_reply_to: &str,
    ) -> Result<PublishedReply, ThreadlyError>;

    /// Lists the account's own posts published at or after `since`.
    async fn list_own_posts(
        &self,
        token: &SecretString,
        account_platform_id: &str,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PlatformPost>, ThreadlyError>;

    /// Lists replies to a post.
    async fn list_replies(
        &self,
        token: &SecretString,
        post_id: &str,
    ) -> Result<Vec<PlatformReply>, ThreadlyError>;

    /// Exchanges a still-valid long-lived token for a fresh one.
    async fn refresh_token(&self, token: &SecretString) -> Result<RefreshedToken, ThreadlyError>;
}
