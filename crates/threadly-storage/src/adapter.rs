// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use threadly_config::model::StorageConfig;
use threadly_core::{
    Account, AccountRepository, HealthStatus, Mention, MentionRepository, MentionStatus,
    MentionType, Reply, ReplyRepository, StorageAdapter, Template, TemplateRepository,
    ThreadlyError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, ThreadlyError> {
        self.db.get().ok_or_else(|| ThreadlyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ThreadlyError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ThreadlyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ThreadlyError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ThreadlyError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MentionRepository for SqliteStorage {
    async fn create_mention(&self, mention: &Mention) -> Result<(), ThreadlyError> {
        queries::mentions::create_mention(self.db()?, mention).await
    }

    async fn get_mention(&self, id: &str) -> Result<Option<Mention>, ThreadlyError> {
        queries::mentions::get_mention(self.db()?, id).await
    }

    async fn get_mention_by_post_id(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Option<Mention>, ThreadlyError> {
        queries::mentions::get_mention_by_post_id(self.db()?, account_id, post_id).await
    }

    async fn list_mentions(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
        status: Option<MentionStatus>,
    ) -> Result<Vec<Mention>, ThreadlyError> {
        queries::mentions::list_mentions(self.db()?, account_id, limit, offset, status).await
    }

    async fn update_mention(&self, mention: &Mention) -> Result<(), ThreadlyError> {
        queries::mentions::update_mention(self.db()?, mention).await
    }

    async fn count_replied_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, ThreadlyError> {
        queries::mentions::count_replied_since(self.db()?, account_id, since).await
    }
}

#[async_trait]
impl ReplyRepository for SqliteStorage {
    async fn create_reply(&self, reply: &Reply) -> Result<(), ThreadlyError> {
        queries::replies::create_reply(self.db()?, reply).await
    }

    async fn get_reply(&self, id: &str) -> Result<Option<Reply>, ThreadlyError> {
        queries::replies::get_reply(self.db()?, id).await
    }

    async fn get_reply_by_mention(
        &self,
        mention_id: &str,
    ) -> Result<Option<Reply>, ThreadlyError> {
        queries::replies::get_reply_by_mention(self.db()?, mention_id).await
    }

    async fn list_replies(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Reply>, ThreadlyError> {
        queries::replies::list_replies(self.db()?, account_id, limit, offset).await
    }

    async fn update_reply(&self, reply: &Reply) -> Result<(), ThreadlyError> {
        queries::replies::update_reply(self.db()?, reply).await
    }
}

#[async_trait]
impl TemplateRepository for SqliteStorage {
    async fn create_template(&self, template: &Template) -> Result<(), ThreadlyError> {
        queries::templates::create_template(self.db()?, template).await
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, ThreadlyError> {
        queries::templates::get_template(self.db()?, id).await
    }

    async fn list_templates(&self, account_id: &str) -> Result<Vec<Template>, ThreadlyError> {
        queries::templates::list_templates(self.db()?, account_id).await
    }

    async fn list_active_templates(
        &self,
        account_id: &str,
        mention_type: MentionType,
    ) -> Result<Vec<Template>, ThreadlyError> {
        queries::templates::list_active_templates(self.db()?, account_id, mention_type).await
    }
}

#[async_trait]
impl AccountRepository for SqliteStorage {
    async fn create_account(&self, account: &Account) -> Result<(), ThreadlyError> {
        queries::accounts::create_account(self.db()?, account).await
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, ThreadlyError> {
        queries::accounts::get_account(self.db()?, id).await
    }

    async fn get_account_by_platform_user_id(
        &self,
        platform_user_id: &str,
    ) -> Result<Option<Account>, ThreadlyError> {
        queries::accounts::get_account_by_platform_user_id(self.db()?, platform_user_id).await
    }

    async fn update_account(&self, account: &Account) -> Result<(), ThreadlyError> {
        queries::accounts::update_account(self.db()?, account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert!(storage.health_check().await.is_err());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }
}
