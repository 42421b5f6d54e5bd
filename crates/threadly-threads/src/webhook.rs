// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook envelope parsing and mention extraction.
//!
//! A delivery carries one or more entries, each for one subscribed account,
//! and each entry carries a list of field changes. Only `mentions` changes
//! become [`MentionEvent`]s; a change that fails to decode is logged and
//! dropped without failing the rest of the envelope.

use serde::Deserialize;
use threadly_core::{MentionAuthor, MentionEvent, ThreadlyError};
use tracing::{debug, warn};

use crate::types::parse_timestamp;

const MENTIONS_FIELD: &str = "mentions";

/// Top-level webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// Changes for one subscribed account.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    /// Platform user id of the receiving account.
    pub id: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    pub field: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct MentionValue {
    from: MentionFrom,
    media_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MentionFrom {
    id: String,
    username: String,
}

/// Decodes the raw body. A body that is not a webhook envelope is rejected.
pub fn parse_payload(body: &[u8]) -> Result<WebhookPayload, ThreadlyError> {
    serde_json::from_slice(body)
        .map_err(|e| ThreadlyError::InvalidPayload(format!("malformed webhook envelope: {e}")))
}

/// Flattens every decodable mention change in the payload, in delivery order.
pub fn extract_mentions(payload: &WebhookPayload) -> Vec<MentionEvent> {
    let mut events = Vec::new();

    for entry in &payload.entry {
        for change in &entry.changes {
            if change.field != MENTIONS_FIELD {
                debug!(field = %change.field, account = %entry.id, "ignoring webhook change");
                continue;
            }

            let value: MentionValue = match serde_json::from_value(change.value.clone()) {
                Ok(v) => v,
                Err(e) => {
                    warn!(account = %entry.id, error = %e, "dropping undecodable mention change");
                    continue;
                }
            };

            events.push(MentionEvent {
                account_platform_id: entry.id.clone(),
                author: MentionAuthor::new(value.from.id, value.from.username, None, false),
                post_id: value.media_id,
                text: value.text,
                media_urls: value.media_url.into_iter().collect(),
                timestamp: value.timestamp.as_deref().and_then(parse_timestamp),
            });
        }
    }

    events
}
