// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-mention continuation: classify, pace, compose, deliver.
//!
//! Every step persists its result before the next one starts. Collaborator
//! failures end the attempt in `failed` with a reason; persistence failures
//! abort the attempt and leave the record in its last stored state. A mention
//! is only marked replied after its reply is stored as sent. Nothing here
//! returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use threadly_core::{
    Account, AnalyzerAdapter, CredentialProvider, Mention, MentionRepository, PlatformAdapter,
    Reply, ReplyRepository, ReplyStatus, ThreadlyError,
};
use tracing::{error, info, warn};

use crate::composer::{ComposedReply, ReplyComposer};
use crate::policy::SkipReason;

pub const REASON_TOKEN_ERROR: &str = "token error";
pub const REASON_DELIVERY_FAILED: &str = "failed to post reply";

/// How one continuation attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Replied { reply_id: String },
    Skipped(SkipReason),
    Failed(String),
    /// A persistence step failed; the stored record is left as it was.
    Aborted,
}

pub struct MentionProcessor {
    mentions: Arc<dyn MentionRepository>,
    replies: Arc<dyn ReplyRepository>,
    analyzer: Arc<dyn AnalyzerAdapter>,
    composer: ReplyComposer,
    credentials: Arc<dyn CredentialProvider>,
    platform: Arc<dyn PlatformAdapter>,
}

impl MentionProcessor {
    pub fn new(
        mentions: Arc<dyn MentionRepository>,
        replies: Arc<dyn ReplyRepository>,
        analyzer: Arc<dyn AnalyzerAdapter>,
        composer: ReplyComposer,
        credentials: Arc<dyn CredentialProvider>,
        platform: Arc<dyn PlatformAdapter>,
    ) -> Self {
        Self {
            mentions,
            replies,
            analyzer,
            composer,
            credentials,
            platform,
        }
    }

    /// Runs one full attempt for `mention` (pending, or failed on retry).
    pub async fn run(&self, mut mention: Mention, account: Account) -> Outcome {
        if let Err(e) = mention.begin_processing() {
            warn!(mention_id = %mention.id, error = %e, "mention cannot be processed");
            return Outcome::Aborted;
        }
        if let Err(e) = self.mentions.update_mention(&mention).await {
            error!(mention_id = %mention.id, error = %e, "failed to mark mention processing");
            return Outcome::Aborted;
        }

        let analysis = match self.analyzer.analyze(&mention.content, &mention.author).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(mention_id = %mention.id, error = %e, "mention analysis failed");
                return self.fail(mention, format!("AI analysis failed: {e}")).await;
            }
        };

        mention.analysis = Some(analysis.clone());
        if let Err(e) = self.mentions.update_mention(&mention).await {
            error!(mention_id = %mention.id, error = %e, "failed to save analysis");
        }

        if analysis.mention_type == threadly_core::MentionType::Spam {
            return self.skip(mention, SkipReason::DetectedAsSpam).await;
        }

        let delay = account.settings.reply_delay_seconds;
        if delay > 0 {
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        let composed = match self.composer.compose(&mention, &analysis).await {
            Ok(composed) => composed,
            Err(e) => {
                error!(mention_id = %mention.id, error = %e, "reply composition failed");
                return self.fail(mention, format!("reply generation failed: {e}")).await;
            }
        };

        let mut reply = match self.prepare_reply(&mention, composed).await {
            Ok(PreparedReply::Pending(reply)) => reply,
            Ok(PreparedReply::AlreadySent(reply)) => {
                info!(mention_id = %mention.id, reply_id = %reply.id, "reply was already delivered");
                return self.complete(mention, reply.id).await;
            }
            Err(e) => {
                error!(mention_id = %mention.id, error = %e, "failed to record reply");
                return Outcome::Aborted;
            }
        };

        let token = match self.credentials.get_valid_access_token(&account.id).await {
            Ok(token) => token,
            Err(e) => {
                error!(mention_id = %mention.id, account_id = %account.id, error = %e, "no usable access token");
                reply.mark_failed(format!("{REASON_TOKEN_ERROR}: {e}"));
                self.save_reply(&reply).await;
                return self.fail(mention, REASON_TOKEN_ERROR.to_string()).await;
            }
        };

        let published = match self
            .platform
            .create_reply(&token, &account.platform_user_id, &reply.content, &mention.post_id)
            .await
        {
            Ok(published) => published,
            Err(e) => {
                error!(mention_id = %mention.id, reply_id = %reply.id, error = %e, "reply delivery failed");
                reply.mark_failed(format!("Threads API error: {e}"));
                self.save_reply(&reply).await;
                return self.fail(mention, REASON_DELIVERY_FAILED.to_string()).await;
            }
        };

        reply.mark_sent(&published);
        if let Err(e) = self.replies.update_reply(&reply).await {
            error!(
                mention_id = %mention.id,
                reply_id = %reply.id,
                threads_reply_id = %published.id,
                error = %e,
                "reply delivered but not recorded as sent"
            );
            return Outcome::Aborted;
        }

        info!(
            mention_id = %mention.id,
            reply_id = %reply.id,
            threads_reply_id = %published.id,
            "replied to mention"
        );
        self.complete(mention, reply.id).await
    }

    /// Creates the mention's reply, or resets the one left by an earlier attempt.
    async fn prepare_reply(
        &self,
        mention: &Mention,
        composed: ComposedReply,
    ) -> Result<PreparedReply, ThreadlyError> {
        if let Some(mut existing) = self.replies.get_reply_by_mention(&mention.id).await? {
            if existing.status == ReplyStatus::Sent {
                return Ok(PreparedReply::AlreadySent(existing));
            }
            existing.reset_for_retry(composed.template_id, composed.content)?;
            self.replies.update_reply(&existing).await?;
            return Ok(PreparedReply::Pending(existing));
        }

        let reply = Reply::new_pending(
            &mention.account_id,
            &mention.id,
            composed.template_id,
            composed.content,
        );
        self.replies.create_reply(&reply).await?;
        Ok(PreparedReply::Pending(reply))
    }

    async fn save_reply(&self, reply: &Reply) {
        if let Err(e) = self.replies.update_reply(reply).await {
            error!(reply_id = %reply.id, status = %reply.status, error = %e, "failed to update reply");
        }
    }

    async fn complete(&self, mut mention: Mention, reply_id: String) -> Outcome {
        if let Err(e) = mention.mark_replied(&reply_id) {
            warn!(mention_id = %mention.id, error = %e, "cannot mark mention replied");
            return Outcome::Aborted;
        }
        self.persist(&mention).await;
        Outcome::Replied { reply_id }
    }

    async fn skip(&self, mut mention: Mention, reason: SkipReason) -> Outcome {
        if let Err(e) = mention.mark_skipped(reason.to_string()) {
            warn!(mention_id = %mention.id, error = %e, "cannot mark mention skipped");
            return Outcome::Aborted;
        }
        self.persist(&mention).await;
        Outcome::Skipped(reason)
    }

    async fn fail(&self, mut mention: Mention, reason: String) -> Outcome {
        if let Err(e) = mention.mark_failed(reason.clone()) {
            warn!(mention_id = %mention.id, error = %e, "cannot mark mention failed");
            return Outcome::Aborted;
        }
        self.persist(&mention).await;
        Outcome::Failed(reason)
    }

    async fn persist(&self, mention: &Mention) {
        if let Err(e) = self.mentions.update_mention(mention).await {
            error!(mention_id = %mention.id, status = %mention.status, error = %e, "failed to update mention");
        }
    }
}

enum PreparedReply {
    Pending(Reply),
    AlreadySent(Reply),
}
