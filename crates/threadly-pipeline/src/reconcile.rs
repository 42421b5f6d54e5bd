// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation pull: recovers mentions the webhook never delivered by
//! scanning replies under the account's recent posts.

use chrono::Utc;
use serde::Serialize;
use threadly_core::{MentionAuthor, PlatformReply, ThreadlyError};
use tracing::{info, warn};

use crate::admission::MentionCandidate;
use crate::service::{MentionPipeline, SubmitOutcome};

/// Counters for one pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub posts_checked: u32,
    /// Admitted now, or found still pending and resumed.
    pub new_mentions: u32,
    /// Already known, self-authored, or not admitted because auto-reply is off.
    pub skipped: u32,
    pub errors: u32,
}

fn candidate_from_reply(reply: PlatformReply) -> MentionCandidate {
    // Listings expose only the handle, so it doubles as the author id.
    let author_id = reply.user_id.unwrap_or_else(|| reply.username.clone());
    MentionCandidate {
        author: MentionAuthor::new(author_id, reply.username, None, false),
        post_id: reply.id,
        content: reply.text.unwrap_or_default(),
        media_urls: reply.media_urls,
        received_at: reply.timestamp.unwrap_or_else(Utc::now),
    }
}

impl MentionPipeline {
    /// Scans the account's recent posts and submits every unseen reply.
    ///
    /// Runs in the caller's task. Failing to resolve the account, its token,
    /// or its post list fails the pull; a failure on one post or reply is
    /// counted and the scan continues.
    pub async fn pull(&self, account_id: &str) -> Result<PullReport, ThreadlyError> {
        let account = self.load_account(account_id).await?;
        let token = self
            .deps
            .credentials
            .get_valid_access_token(&account.id)
            .await?;

        let since = Utc::now() - self.settings.lookback;
        let posts = self
            .deps
            .platform
            .list_own_posts(&token, &account.platform_user_id, since, self.settings.max_posts)
            .await?;

        let mut report = PullReport::default();

        for post in posts {
            report.posts_checked += 1;

            let replies = match self.deps.platform.list_replies(&token, &post.id).await {
                Ok(replies) => replies,
                Err(e) => {
                    warn!(account_id, post_id = %post.id, error = %e, "failed to list replies");
                    report.errors += 1;
                    continue;
                }
            };

            for reply in replies {
                if reply.username.eq_ignore_ascii_case(&account.username) {
                    report.skipped += 1;
                    continue;
                }

                let reply_id = reply.id.clone();
                match self.submit(&account, candidate_from_reply(reply)).await {
                    Ok(SubmitOutcome::AlreadyKnown | SubmitOutcome::AutoReplyDisabled) => {
                        report.skipped += 1;
                    }
                    Ok(_) => {
                        report.new_mentions += 1;
                        info!(account_id, post_id = %reply_id, "recovered mention from pull");
                    }
                    Err(e) => {
                        warn!(account_id, post_id = %reply_id, error = %e, "failed to submit pulled reply");
                        report.errors += 1;
                    }
                }
            }
        }

        info!(
            account_id,
            posts_checked = report.posts_checked,
            new_mentions = report.new_mentions,
            skipped = report.skipped,
            errors = report.errors,
            "pull completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulled_reply_uses_handle_when_id_is_missing() {
        let c = candidate_from_reply(PlatformReply {
            id: "r1".into(),
            text: None,
            username: "bob".into(),
            user_id: None,
            timestamp: None,
            media_urls: vec![],
        });
        assert_eq!(c.author.platform_user_id, "bob");
        assert_eq!(c.author.display_name, "bob");
        assert_eq!(c.post_id, "r1");
        assert_eq!(c.content, "");
    }
}
