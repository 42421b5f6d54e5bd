// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dedup gate: durably records a mention the first time its post is seen.
//!
//! The lookup by post id is a fast path only. Two concurrent admissions for
//! the same post can both miss it, so the storage uniqueness constraint is
//! what decides: the loser's `Duplicate` is reported as [`Admission::AlreadyKnown`].
//!
//! A stored mention that is still `pending` was never taken past policy, for
//! example because persisting the policy outcome failed. Seeing its post
//! again hands it back as [`Admission::Unfinished`] so it can be resumed.

use chrono::{DateTime, Utc};
use threadly_core::{
    Mention, MentionAuthor, MentionEvent, MentionRepository, MentionStatus, ThreadlyError,
};
use tracing::debug;

/// A mention as observed on the platform, before admission.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionCandidate {
    pub post_id: String,
    pub author: MentionAuthor,
    pub content: String,
    pub media_urls: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl MentionCandidate {
    pub fn from_event(event: MentionEvent) -> Self {
        Self {
            post_id: event.post_id,
            author: event.author,
            content: event.text,
            media_urls: event.media_urls,
            received_at: event.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// A new pending mention was stored.
    Admitted(Mention),
    /// A mention for this post already exists; nothing was written.
    AlreadyKnown,
    /// A mention for this post exists but is still pending.
    Unfinished(Mention),
}

/// Stores `candidate` as a pending mention of `account_id` unless its post
/// was already admitted.
pub async fn admit(
    mentions: &dyn MentionRepository,
    account_id: &str,
    candidate: MentionCandidate,
) -> Result<Admission, ThreadlyError> {
    if let Some(existing) = mentions
        .get_mention_by_post_id(account_id, &candidate.post_id)
        .await?
    {
        if existing.status == MentionStatus::Pending {
            debug!(mention_id = %existing.id, account_id, "known mention still pending");
            return Ok(Admission::Unfinished(existing));
        }
        debug!(account_id, post_id = %candidate.post_id, "mention already known");
        return Ok(Admission::AlreadyKnown);
    }

    let mention = Mention::new_pending(
        account_id,
        candidate.post_id,
        candidate.author,
        candidate.content,
        candidate.media_urls,
        candidate.received_at,
    );

    match mentions.create_mention(&mention).await {
        Ok(()) => {
            debug!(mention_id = %mention.id, account_id, post_id = %mention.post_id, "mention admitted");
            Ok(Admission::Admitted(mention))
        }
        Err(e) if e.is_duplicate() => {
            debug!(account_id, post_id = %mention.post_id, "lost admission race");
            Ok(Admission::AlreadyKnown)
        }
        Err(e) => Err(e),
    }
}
