// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pipeline front door used by the webhook handler, the reconciliation
//! puller and the operator API.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use threadly_config::ThreadlyConfig;
use threadly_core::{
    Account, AccountRepository, AnalyzerAdapter, CredentialProvider, Mention, MentionEvent,
    MentionRepository, MentionStatus, PlatformAdapter, ReplyRepository, TemplateRepository,
    ThreadlyError,
};
use tracing::{debug, info, warn};

use crate::admission::{Admission, MentionCandidate, admit};
use crate::composer::ReplyComposer;
use crate::dispatcher::ContinuationDispatcher;
use crate::policy::{self, SkipReason, Verdict};
use crate::processor::MentionProcessor;

/// Collaborators the pipeline is built from.
#[derive(Clone)]
pub struct PipelineDeps {
    pub mentions: Arc<dyn MentionRepository>,
    pub replies: Arc<dyn ReplyRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub analyzer: Arc<dyn AnalyzerAdapter>,
    pub platform: Arc<dyn PlatformAdapter>,
    pub credentials: Arc<dyn CredentialProvider>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_concurrent_continuations: usize,
    /// How far back the reconciliation puller looks for own posts.
    pub lookback: chrono::Duration,
    /// Most own posts scanned per pull.
    pub max_posts: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&ThreadlyConfig::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &ThreadlyConfig) -> Self {
        Self {
            max_concurrent_continuations: config.server.max_concurrent_continuations,
            lookback: chrono::Duration::hours(i64::from(config.reconcile.lookback_hours)),
            max_posts: config.reconcile.max_posts,
        }
    }
}

/// Result of submitting one observed mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// No managed account has this platform id.
    UnknownAccount,
    /// The account has auto-reply off; nothing was stored.
    AutoReplyDisabled,
    /// The post was admitted before.
    AlreadyKnown,
    Skipped {
        mention_id: String,
        reason: String,
    },
    /// Admitted and handed to a background continuation.
    Dispatched { mention_id: String },
}

pub struct MentionPipeline {
    pub(crate) deps: PipelineDeps,
    pub(crate) settings: PipelineSettings,
    dispatcher: ContinuationDispatcher,
}

impl MentionPipeline {
    pub fn new(deps: PipelineDeps, settings: PipelineSettings) -> Self {
        let composer = ReplyComposer::new(deps.templates.clone(), deps.analyzer.clone());
        let processor = MentionProcessor::new(
            deps.mentions.clone(),
            deps.replies.clone(),
            deps.analyzer.clone(),
            composer,
            deps.credentials.clone(),
            deps.platform.clone(),
        );
        let dispatcher = ContinuationDispatcher::new(
            Arc::new(processor),
            settings.max_concurrent_continuations,
        );
        Self {
            deps,
            settings,
            dispatcher,
        }
    }

    /// Routes webhook events to their accounts and submits each one.
    ///
    /// Events for unknown accounts are skipped. Storage failures abort the
    /// batch so the provider redelivers it; already-admitted events are
    /// no-ops on redelivery.
    pub async fn ingest_events(
        &self,
        events: Vec<MentionEvent>,
    ) -> Result<Vec<SubmitOutcome>, ThreadlyError> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            let account = self
                .deps
                .accounts
                .get_account_by_platform_user_id(&event.account_platform_id)
                .await?;
            let Some(account) = account else {
                warn!(platform_user_id = %event.account_platform_id, post_id = %event.post_id, "mention for unknown account");
                outcomes.push(SubmitOutcome::UnknownAccount);
                continue;
            };
            let outcome = self
                .submit(&account, MentionCandidate::from_event(event))
                .await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Admits a mention, applies account policy and, if it passes, starts
    /// its continuation in the background.
    ///
    /// A post whose mention is still `pending` from an earlier sighting is
    /// resumed instead of ignored, unless something else holds it.
    pub async fn submit(
        &self,
        account: &Account,
        candidate: MentionCandidate,
    ) -> Result<SubmitOutcome, ThreadlyError> {
        if !account.auto_reply_enabled {
            debug!(account_id = %account.id, post_id = %candidate.post_id, "auto-reply disabled");
            return Ok(SubmitOutcome::AutoReplyDisabled);
        }

        let (claim, mut mention) =
            match admit(self.deps.mentions.as_ref(), &account.id, candidate).await? {
                Admission::Admitted(mention) => match self.dispatcher.claim(&mention.id) {
                    Some(claim) => (claim, mention),
                    None => return Ok(SubmitOutcome::AlreadyKnown),
                },
                Admission::Unfinished(seen) => {
                    let Some(claim) = self.dispatcher.claim(&seen.id) else {
                        return Ok(SubmitOutcome::AlreadyKnown);
                    };
                    // The earlier read may predate a continuation that has since finished.
                    match self.deps.mentions.get_mention(&seen.id).await? {
                        Some(current) if current.status == MentionStatus::Pending => {
                            info!(mention_id = %current.id, account_id = %account.id, "resuming pending mention");
                            (claim, current)
                        }
                        _ => return Ok(SubmitOutcome::AlreadyKnown),
                    }
                }
                Admission::AlreadyKnown => return Ok(SubmitOutcome::AlreadyKnown),
            };

        match policy::evaluate(self.deps.mentions.as_ref(), account, &mention, Utc::now()).await
        {
            Verdict::Skip(reason) => {
                let outcome = self.skip_admitted(&mut mention, reason).await;
                drop(claim);
                outcome
            }
            Verdict::Proceed => {
                let mention_id = mention.id.clone();
                self.dispatcher.dispatch(claim, mention, account.clone());
                Ok(SubmitOutcome::Dispatched { mention_id })
            }
        }
    }

    async fn skip_admitted(
        &self,
        mention: &mut Mention,
        reason: SkipReason,
    ) -> Result<SubmitOutcome, ThreadlyError> {
        mention.mark_skipped(reason.to_string())?;
        self.deps.mentions.update_mention(mention).await?;
        info!(mention_id = %mention.id, reason = %reason, "mention skipped by policy");
        Ok(SubmitOutcome::Skipped {
            mention_id: mention.id.clone(),
            reason: reason.to_string(),
        })
    }

    /// Reprocesses a failed mention from the top, classification included.
    pub async fn retry(&self, account_id: &str, mention_id: &str) -> Result<(), ThreadlyError> {
        self.get_mention(account_id, mention_id).await?;
        let claim = self.dispatcher.claim(mention_id).ok_or_else(|| {
            ThreadlyError::InvalidState(format!("mention {mention_id} is already being processed"))
        })?;

        let mention = self.get_mention(account_id, mention_id).await?;
        if mention.status != MentionStatus::Failed {
            return Err(ThreadlyError::InvalidState(format!(
                "can only retry failed mentions (mention {mention_id} is {})",
                mention.status
            )));
        }
        let account = self.load_account(account_id).await?;
        info!(mention_id, account_id, "retrying mention");
        self.dispatcher.dispatch(claim, mention, account);
        Ok(())
    }

    /// Fetches a mention owned by `account_id`.
    pub async fn get_mention(
        &self,
        account_id: &str,
        mention_id: &str,
    ) -> Result<Mention, ThreadlyError> {
        let mention = self
            .deps
            .mentions
            .get_mention(mention_id)
            .await?
            .ok_or_else(|| ThreadlyError::NotFound {
                entity: "mention",
                id: mention_id.to_string(),
            })?;
        if mention.account_id != account_id {
            return Err(ThreadlyError::Forbidden(format!(
                "mention {mention_id} belongs to another account"
            )));
        }
        Ok(mention)
    }

    /// Lists an account's mentions, newest first.
    pub async fn list_mentions(
        &self,
        account_id: &str,
        limit: u32,
        offset: u32,
        status: Option<MentionStatus>,
    ) -> Result<Vec<Mention>, ThreadlyError> {
        self.deps
            .mentions
            .list_mentions(account_id, limit, offset, status)
            .await
    }

    pub(crate) async fn load_account(&self, account_id: &str) -> Result<Account, ThreadlyError> {
        self.deps
            .accounts
            .get_account(account_id)
            .await?
            .ok_or_else(|| ThreadlyError::NotFound {
                entity: "account",
                id: account_id.to_string(),
            })
    }

    /// Waits for every continuation dispatched so far.
    pub async fn settle(&self) {
        self.dispatcher.settle().await;
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Waits up to `timeout` for running continuations; `false` if some remain.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.dispatcher.drain(timeout).await
    }
}
