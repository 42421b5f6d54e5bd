// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for mentions, replies, templates, and accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ThreadlyError;
use crate::types::{Account, HealthStatus, Mention, MentionStatus, MentionType, Reply, Template};

#[async_trait]
pub trait MentionRepository: Send + Sync {
    /// Inserts a new mention. Fails with [`ThreadlyError::Duplicate`] when the
    /// account already has a mention for the same post.
    async fn create_mention(&self, mention: &Mention) -> Result<(), ThreadlyError>;

    async fn get_mention(&self, id: &str) -> Result<Option<Mention>, ThreadlyError>;

    async fn get_mention_by_post_id(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Option<Mention>, ThreadlyError>;

    /// Lists an account's mentions, newest first.
    async fn list_mentions(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
        status: Option<MentionStatus>,
    ) -> Result<Vec<Mention>, ThreadlyError>;

    /// Persists every mutable field of an existing mention.
    async fn update_mention(&self, mention: &Mention) -> Result<(), ThreadlyError>;

    /// Counts the account's mentions that reached `replied` at or after `since`.
    async fn count_replied_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, ThreadlyError>;
}

#[async_trait]
pub trait ReplyRepository: Send + Sync {
    /// Inserts a reply. Fails with [`ThreadlyError::Duplicate`] when the mention
    /// already has one.
    async fn create_reply(&self, reply: &Reply) -> Result<(), ThreadlyError>;

    async fn get_reply(&self, id: &str) -> Result<Option<Reply>, ThreadlyError>;

    async fn get_reply_by_mention(&self, mention_id: &str)
    -> Result<Option<Reply>, ThreadlyError>;

    async fn list_replies(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Reply>, ThreadlyError>;

    async fn update_reply(&self, reply: &Reply) -> Result<(), ThreadlyError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create_template(&self, template: &Template) -> Result<(), ThreadlyError>;

    async fn get_template(&self, id: &str) -> Result<Option<Template>, ThreadlyError>;

    async fn list_templates(&self, account_id: &str) -> Result<Vec<Template>, ThreadlyError>;

    /// Active templates for a mention type, lowest priority value first and
    /// newest first among equal priorities.
    async fn list_active_templates(
        &self,
        account_id: &str,
        mention_type: MentionType,
    ) -> Result<Vec<Template>, ThreadlyError>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_account(&self, account: &Account) -> Result<(), ThreadlyError>;

    async fn get_account(&self, id: &str) -> Result<Option<Account>, ThreadlyError>;

    async fn get_account_by_platform_user_id(
        &self,
        platform_user_id: &str,
    ) -> Result<Option<Account>, ThreadlyError>;

    async fn update_account(&self, account: &Account) -> Result<(), ThreadlyError>;
}

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections and expose
/// every repository the pipeline needs.
#[async_trait]
pub trait StorageAdapter:
    MentionRepository + ReplyRepository + TemplateRepository + AccountRepository
{
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), ThreadlyError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), ThreadlyError>;

    /// Checks that the backend can still serve queries.
    async fn health_check(&self) -> Result<HealthStatus, ThreadlyError>;
}
