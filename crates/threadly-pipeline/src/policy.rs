// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account policy checks run synchronously after admission, before any
//! classifier or platform call.

use chrono::{DateTime, Duration, Utc};
use strum::{AsRefStr, Display};
use threadly_core::{Account, Mention, MentionAuthor, MentionRepository};
use tracing::{debug, warn};

/// Why a mention was skipped. The display text is stored as the mention's reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum SkipReason {
    #[strum(serialize = "matched skip criteria")]
    MatchedSkipCriteria,
    #[strum(serialize = "rate limit exceeded")]
    RateLimitExceeded,
    #[strum(serialize = "detected as spam")]
    DetectedAsSpam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Skip(SkipReason),
}

/// Trailing window for the replies-per-hour limit.
pub fn rate_window() -> Duration {
    Duration::hours(1)
}

/// True when the account ignores this author or the content contains an
/// ignore keyword (case-insensitive).
pub fn matches_skip_criteria(account: &Account, author: &MentionAuthor, content: &str) -> bool {
    if account.settings.ignore_verified_accounts && author.verified {
        return true;
    }
    let haystack = content.to_lowercase();
    account
        .settings
        .ignore_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && haystack.contains(&k))
}

/// Runs the skip-criteria and rate-limit checks for a freshly admitted mention.
///
/// The replied count is read once, so concurrent admissions for one account
/// may all pass. A failed count is logged and does not block the mention.
pub async fn evaluate(
    mentions: &dyn MentionRepository,
    account: &Account,
    mention: &Mention,
    now: DateTime<Utc>,
) -> Verdict {
    if matches_skip_criteria(account, &mention.author, &mention.content) {
        debug!(mention_id = %mention.id, "mention matched skip criteria");
        return Verdict::Skip(SkipReason::MatchedSkipCriteria);
    }

    match mentions
        .count_replied_since(&account.id, now - rate_window())
        .await
    {
        Ok(count) if count >= u64::from(account.settings.max_replies_per_hour) => {
            debug!(
                mention_id = %mention.id,
                account_id = %account.id,
                count,
                limit = account.settings.max_replies_per_hour,
                "hourly reply limit reached"
            );
            Verdict::Skip(SkipReason::RateLimitExceeded)
        }
        Ok(_) => Verdict::Proceed,
        Err(e) => {
            warn!(account_id = %account.id, error = %e, "failed to count recent replies");
            Verdict::Proceed
        }
    }
}
