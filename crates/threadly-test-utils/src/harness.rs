// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `PipelineHarness` wires a [`MentionPipeline`] to an in-memory store and
//! mock collaborators, with one managed account already registered.

use std::sync::Arc;

use chrono::Utc;
use threadly_core::{
    Account, AccountRepository, Mention, MentionAuthor, MentionEvent, MentionRepository, Reply,
    ReplyRepository, Template, TemplateRepository, ThreadlyError,
};
use threadly_pipeline::{MentionPipeline, PipelineDeps, PipelineSettings};

use crate::memory_store::MemoryStore;
use crate::mock_analyzer::MockAnalyzer;
use crate::mock_credentials::MockCredentials;
use crate::mock_platform::MockPlatform;

pub const ACCOUNT_PLATFORM_ID: &str = "17841400000000001";
pub const ACCOUNT_USERNAME: &str = "brand";

/// Builder for [`PipelineHarness`].
pub struct PipelineHarnessBuilder {
    account: Account,
    settings: PipelineSettings,
}

impl PipelineHarnessBuilder {
    fn new() -> Self {
        let mut account = Account::new(ACCOUNT_PLATFORM_ID, ACCOUNT_USERNAME);
        account.settings.reply_delay_seconds = 0;
        Self {
            account,
            settings: PipelineSettings::default(),
        }
    }

    /// Adjusts the managed account before it is stored.
    pub fn with_account(mut self, f: impl FnOnce(&mut Account)) -> Self {
        f(&mut self.account);
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn build(self) -> Result<PipelineHarness, ThreadlyError> {
        let store = Arc::new(MemoryStore::new());
        store.create_account(&self.account).await?;

        let analyzer = Arc::new(MockAnalyzer::new());
        let platform = Arc::new(MockPlatform::new());
        let credentials = Arc::new(MockCredentials::new());

        let deps = PipelineDeps {
            mentions: store.clone(),
            replies: store.clone(),
            templates: store.clone(),
            accounts: store.clone(),
            analyzer: analyzer.clone(),
            platform: platform.clone(),
            credentials: credentials.clone(),
        };

        Ok(PipelineHarness {
            pipeline: Arc::new(MentionPipeline::new(deps, self.settings)),
            store,
            analyzer,
            platform,
            credentials,
            account: self.account,
        })
    }
}

pub struct PipelineHarness {
    pub pipeline: Arc<MentionPipeline>,
    pub store: Arc<MemoryStore>,
    pub analyzer: Arc<MockAnalyzer>,
    pub platform: Arc<MockPlatform>,
    pub credentials: Arc<MockCredentials>,
    pub account: Account,
}

impl PipelineHarness {
    pub fn builder() -> PipelineHarnessBuilder {
        PipelineHarnessBuilder::new()
    }

    pub async fn new() -> Result<Self, ThreadlyError> {
        Self::builder().build().await
    }

    /// A webhook mention of the managed account.
    pub fn event(&self, post_id: &str, author: &str, text: &str) -> MentionEvent {
        MentionEvent {
            account_platform_id: self.account.platform_user_id.clone(),
            author: MentionAuthor::new(format!("id-{author}"), author, None, false),
            post_id: post_id.to_string(),
            text: text.to_string(),
            media_urls: vec![],
            timestamp: Some(Utc::now()),
        }
    }

    pub async fn add_template(&self, template: &Template) -> Result<(), ThreadlyError> {
        self.store.create_template(template).await
    }

    pub async fn mention_for_post(&self, post_id: &str) -> Option<Mention> {
        self.store
            .get_mention_by_post_id(&self.account.id, post_id)
            .await
            .ok()
            .flatten()
    }

    pub async fn reply_for(&self, mention_id: &str) -> Option<Reply> {
        self.store
            .get_reply_by_mention(mention_id)
            .await
            .ok()
            .flatten()
    }

    /// Waits for every background continuation started so far.
    pub async fn settle(&self) {
        self.pipeline.settle().await;
    }
}
