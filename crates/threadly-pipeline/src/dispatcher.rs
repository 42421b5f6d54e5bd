// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detached execution of mention continuations.
//!
//! Each dispatched continuation runs on its own tokio task, independent of
//! the request that admitted it. A semaphore bounds how many run at once;
//! the task tracker lets shutdown wait for the ones in flight.
//!
//! Work on a mention happens under a [`Claim`]. At most one claim per mention
//! exists at a time, so a redelivery or retry can never start a second
//! continuation next to a running one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use threadly_core::{Account, Mention};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::processor::{MentionProcessor, Outcome};

/// Mention ids currently claimed.
#[derive(Default, Clone)]
pub struct ActiveMentions {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ActiveMentions {
    /// Claims `mention_id`, or `None` if someone already holds it.
    pub fn claim(&self, mention_id: &str) -> Option<Claim> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(mention_id.to_string()) {
            return None;
        }
        Some(Claim {
            mention_id: mention_id.to_string(),
            active: self.clone(),
        })
    }
}

/// Exclusive hold on one mention. Released on drop.
pub struct Claim {
    mention_id: String,
    active: ActiveMentions,
}

impl Claim {
    pub fn mention_id(&self) -> &str {
        &self.mention_id
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.active
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.mention_id);
    }
}

pub struct ContinuationDispatcher {
    processor: Arc<MentionProcessor>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    active: ActiveMentions,
}

impl ContinuationDispatcher {
    pub fn new(processor: Arc<MentionProcessor>, max_concurrent: usize) -> Self {
        Self {
            processor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
            active: ActiveMentions::default(),
        }
    }

    pub fn claim(&self, mention_id: &str) -> Option<Claim> {
        self.active.claim(mention_id)
    }

    /// Starts a continuation for `mention` and returns immediately. The
    /// claim is held until the continuation ends.
    pub fn dispatch(&self, claim: Claim, mention: Mention, account: Account) {
        let processor = self.processor.clone();
        let permits = self.permits.clone();
        let mention_id = claim.mention_id().to_string();

        self.tracker.spawn(async move {
            let _claim = claim;
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!(mention_id = %mention_id, "continuation pool closed, dropping mention");
                return;
            };
            let outcome = processor.run(mention, account).await;
            match &outcome {
                Outcome::Replied { reply_id } => {
                    debug!(mention_id = %mention_id, reply_id = %reply_id, "continuation finished: replied");
                }
                Outcome::Skipped(reason) => {
                    debug!(mention_id = %mention_id, reason = %reason, "continuation finished: skipped");
                }
                Outcome::Failed(reason) => {
                    debug!(mention_id = %mention_id, reason = %reason, "continuation finished: failed");
                }
                Outcome::Aborted => {
                    debug!(mention_id = %mention_id, "continuation aborted");
                }
            }
        });
    }

    /// Number of continuations that have not finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every continuation dispatched so far has finished.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Waits up to `timeout` for in-flight continuations. Returns `false`
    /// if some were still running when the timeout elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "waiting for in-flight continuations");
        }
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(remaining = self.tracker.len(), "continuations still running at shutdown");
                false
            }
        }
    }
}
