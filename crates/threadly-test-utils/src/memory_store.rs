// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of every repository trait.
//!
//! Enforces the same uniqueness rules as the SQLite schema: one mention per
//! (account, post), one reply per mention, one account per platform user id.
//! Individual operations can be made to fail to exercise persistence-error
//! paths.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use threadly_core::{
    Account, AccountRepository, HealthStatus, Mention, MentionRepository, MentionStatus,
    MentionType, Reply, ReplyRepository, StorageAdapter, Template, TemplateRepository,
    ThreadlyError,
};

#[derive(Default)]
struct Tables {
    mentions: HashMap<String, Mention>,
    replies: HashMap<String, Reply>,
    templates: HashMap<String, Template>,
    accounts: HashMap<String, Account>,
}

/// Operations that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateMention,
    UpdateMention,
    CountReplied,
    CreateReply,
    UpdateReply,
    ListTemplates,
    GetAccount,
}

/// Shared in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<Vec<FailPoint>>,
    closed: AtomicBool,
}

fn injected(point: FailPoint) -> ThreadlyError {
    ThreadlyError::Storage {
        source: format!("injected failure at {point:?}").into(),
    }
}

fn poisoned() -> ThreadlyError {
    ThreadlyError::Internal("memory store lock poisoned".into())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `point` fail until [`MemoryStore::heal`].
    pub fn fail(&self, point: FailPoint) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(point);
        }
    }

    pub fn heal(&self, point: FailPoint) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.retain(|p| *p != point);
        }
    }

    fn check(&self, point: FailPoint) -> Result<(), ThreadlyError> {
        let failing = self.failing.lock().map_err(|_| poisoned())?;
        if failing.contains(&point) {
            return Err(injected(point));
        }
        Ok(())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, ThreadlyError> {
        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        Ok(f(&mut tables))
    }

    /// Every mention in the store, in no particular order.
    pub fn all_mentions(&self) -> Vec<Mention> {
        self.with(|t| t.mentions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every reply in the store, in no particular order.
    pub fn all_replies(&self) -> Vec<Reply> {
        self.with(|t| t.replies.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn mention_count(&self) -> usize {
        self.with(|t| t.mentions.len()).unwrap_or_default()
    }

    /// Inserts a mention directly, bypassing uniqueness checks.
    pub fn seed_mention(&self, mention: Mention) {
        let _ = self.with(|t| t.mentions.insert(mention.id.clone(), mention));
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn initialize(&self) -> Result<(), ThreadlyError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ThreadlyError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ThreadlyError> {
        if self.is_closed() {
            return Ok(HealthStatus::Unhealthy("store closed".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MentionRepository for MemoryStore {
    async fn create_mention(&self, mention: &Mention) -> Result<(), ThreadlyError> {
        self.check(FailPoint::CreateMention)?;
        self.with(|t| {
            let clash = t.mentions.contains_key(&mention.id)
                || t.mentions.values().any(|m| {
                    m.account_id == mention.account_id && m.post_id == mention.post_id
                });
            if clash {
                return Err(ThreadlyError::Duplicate {
                    entity: "mention",
                    key: format!("{}/{}", mention.account_id, mention.post_id),
                });
            }
            t.mentions.insert(mention.id.clone(), mention.clone());
            Ok(())
        })?
    }

    async fn get_mention(&self, id: &str) -> Result<Option<Mention>, ThreadlyError> {
        self.with(|t| t.mentions.get(id).cloned())
    }

    async fn get_mention_by_post_id(
        &self,
        account_id: &str,
        post_id: &str,
    ) -> Result<Option<Mention>, ThreadlyError> {
        self.with(|t| {
            t.mentions
                .values()
                .find(|m| m.account_id == account_id && m.post_id == post_id)
                .cloned()
        })
    }

    async fn list_mentions(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
        status: Option<MentionStatus>,
    ) -> Result<Vec<Mention>, ThreadlyError> {
        self.with(|t| {
            let mut rows: Vec<Mention> = t
                .mentions
                .values()
                .filter(|m| m.account_id == account_id)
                .filter(|m| status.is_none_or(|s| m.status == s))
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.received_at
                    .cmp(&a.received_at)
                    .then(b.created_at.cmp(&a.created_at))
            });
            rows.into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect()
        })
    }

    async fn update_mention(&self, mention: &Mention) -> Result<(), ThreadlyError> {
        self.check(FailPoint::UpdateMention)?;
        self.with(|t| match t.mentions.get_mut(&mention.id) {
            Some(row) => {
                *row = mention.clone();
                Ok(())
            }
            None => Err(ThreadlyError::NotFound {
                entity: "mention",
                id: mention.id.clone(),
            }),
        })?
    }

    async fn count_replied_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, ThreadlyError> {
        self.check(FailPoint::CountReplied)?;
        self.with(|t| {
            t.mentions
                .values()
                .filter(|m| {
                    m.account_id == account_id
                        && m.status == MentionStatus::Replied
                        && m.processed_at.is_some_and(|p| p >= since)
                })
                .count() as u64
        })
    }
}

#[async_trait]
impl ReplyRepository for MemoryStore {
    async fn create_reply(&self, reply: &Reply) -> Result<(), ThreadlyError> {
        self.check(FailPoint::CreateReply)?;
        self.with(|t| {
            let clash = t.replies.contains_key(&reply.id)
                || t.replies.values().any(|r| r.mention_id == reply.mention_id);
            if clash {
                return Err(ThreadlyError::Duplicate {
                    entity: "reply",
                    key: reply.mention_id.clone(),
                });
            }
            t.replies.insert(reply.id.clone(), reply.clone());
            Ok(())
        })?
    }

    async fn get_reply(&self, id: &str) -> Result<Option<Reply>, ThreadlyError> {
        self.with(|t| t.replies.get(id).cloned())
    }

    async fn get_reply_by_mention(
        &self,
        mention_id: &str,
    ) -> Result<Option<Reply>, ThreadlyError> {
        self.with(|t| {
            t.replies
                .values()
                .find(|r| r.mention_id == mention_id)
                .cloned()
        })
    }

    async fn list_replies(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Reply>, ThreadlyError> {
        self.with(|t| {
            let mut rows: Vec<Reply> = t
                .replies
                .values()
                .filter(|r| r.account_id == account_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows.into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect()
        })
    }

    async fn update_reply(&self, reply: &Reply) -> Result<(), ThreadlyError> {
        self.check(FailPoint::UpdateReply)?;
        self.with(|t| match t.replies.get_mut(&reply.id) {
            Some(row) => {
                *row = reply.clone();
                Ok(())
            }
            None => Err(ThreadlyError::NotFound {
                entity: "reply",
                id: reply.id.clone(),
            }),
        })?
    }
}

fn by_precedence(a: &Template, b: &Template) -> std::cmp::Ordering {
    a.priority
        .cmp(&b.priority)
        .then(b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn create_template(&self, template: &Template) -> Result<(), ThreadlyError> {
        self.with(|t| {
            if t.templates.contains_key(&template.id) {
                return Err(ThreadlyError::Duplicate {
                    entity: "template",
                    key: template.id.clone(),
                });
            }
            t.templates.insert(template.id.clone(), template.clone());
            Ok(())
        })?
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, ThreadlyError> {
        self.with(|t| t.templates.get(id).cloned())
    }

    async fn list_templates(&self, account_id: &str) -> Result<Vec<Template>, ThreadlyError> {
        self.check(FailPoint::ListTemplates)?;
        self.with(|t| {
            let mut rows: Vec<Template> = t
                .templates
                .values()
                .filter(|tpl| tpl.account_id == account_id)
                .cloned()
                .collect();
            rows.sort_by(by_precedence);
            rows
        })
    }

    async fn list_active_templates(
        &self,
        account_id: &str,
        mention_type: MentionType,
    ) -> Result<Vec<Template>, ThreadlyError> {
        self.check(FailPoint::ListTemplates)?;
        self.with(|t| {
            let mut rows: Vec<Template> = t
                .templates
                .values()
                .filter(|tpl| {
                    tpl.account_id == account_id
                        && tpl.mention_type == mention_type
                        && tpl.is_active
                })
                .cloned()
                .collect();
            rows.sort_by(by_precedence);
            rows
        })
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_account(&self, account: &Account) -> Result<(), ThreadlyError> {
        self.with(|t| {
            let clash = t.accounts.contains_key(&account.id)
                || t
                    .accounts
                    .values()
                    .any(|a| a.platform_user_id == account.platform_user_id);
            if clash {
                return Err(ThreadlyError::Duplicate {
                    entity: "account",
                    key: account.platform_user_id.clone(),
                });
            }
            t.accounts.insert(account.id.clone(), account.clone());
            Ok(())
        })?
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, ThreadlyError> {
        self.check(FailPoint::GetAccount)?;
        self.with(|t| t.accounts.get(id).cloned())
    }

    async fn get_account_by_platform_user_id(
        &self,
        platform_user_id: &str,
    ) -> Result<Option<Account>, ThreadlyError> {
        self.check(FailPoint::GetAccount)?;
        self.with(|t| {
            t.accounts
                .values()
                .find(|a| a.platform_user_id == platform_user_id)
                .cloned()
        })
    }

    async fn update_account(&self, account: &Account) -> Result<(), ThreadlyError> {
        self.with(|t| match t.accounts.get_mut(&account.id) {
            Some(row) => {
                *row = account.clone();
                Ok(())
            }
            None => Err(ThreadlyError::NotFound {
                entity: "account",
                id: account.id.clone(),
            }),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadly_core::MentionAuthor;

    fn mention(account: &str, post: &str) -> Mention {
        Mention::new_pending(
            account,
            post,
            MentionAuthor::new("u", "user", None, false),
            "hello",
            vec![],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn same_post_is_duplicate_per_account_only() {
        let store = MemoryStore::new();
        store.create_mention(&mention("a", "p1")).await.unwrap();
        let err = store.create_mention(&mention("a", "p1")).await.unwrap_err();
        assert!(err.is_duplicate());
        store.create_mention(&mention("b", "p1")).await.unwrap();
        assert_eq!(store.mention_count(), 2);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_mention(&mention("a", "p")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_can_be_healed() {
        let store = MemoryStore::new();
        store.fail(FailPoint::CreateMention);
        assert!(store.create_mention(&mention("a", "p")).await.is_err());
        store.heal(FailPoint::CreateMention);
        assert!(store.create_mention(&mention("a", "p")).await.is_ok());
    }

    #[tokio::test]
    async fn one_reply_per_mention() {
        let store = MemoryStore::new();
        store
            .create_reply(&Reply::new_pending("a", "m1", None, "hi"))
            .await
            .unwrap();
        let err = store
            .create_reply(&Reply::new_pending("a", "m1", None, "again"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }
}
