// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by every Threadly crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ThreadlyError;

/// Health of a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

/// Generates a fresh record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// --- Mentions ---

/// Classification assigned to a mention by the analyzer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MentionType {
    Complaint,
    Positive,
    Question,
    Neutral,
    Spam,
}

/// Lifecycle state of a mention.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MentionStatus {
    Pending,
    Processing,
    Replied,
    Skipped,
    Failed,
}

impl MentionStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: MentionStatus) -> bool {
        use MentionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Skipped)
                | (Processing, Replied)
                | (Processing, Skipped)
                | (Processing, Failed)
                | (Failed, Processing)
        )
    }
}

/// The account that wrote a mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionAuthor {
    pub platform_user_id: String,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub verified: bool,
}

impl MentionAuthor {
    /// Builds an author record, filling the display name from the username
    /// when the platform omits it.
    pub fn new(
        platform_user_id: impl Into<String>,
        username: impl Into<String>,
        display_name: Option<String>,
        verified: bool,
    ) -> Self {
        let username = username.into();
        let display_name = display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| username.clone());
        Self {
            platform_user_id: platform_user_id.into(),
            username,
            display_name,
            verified,
        }
    }
}

/// Classifier output attached to a mention once analysis succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionAnalysis {
    pub mention_type: MentionType,
    /// Sentiment in `[-1.0, 1.0]`.
    pub sentiment: f64,
    pub intent: String,
    pub urgency: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub suggested_tone: String,
    /// Verbatim classifier response, used for keyword conditions.
    pub raw_analysis: String,
}

/// A third-party post that references a managed account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub account_id: String,
    /// Platform identifier of the mentioning post. Unique per account.
    pub post_id: String,
    pub author: MentionAuthor,
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub analysis: Option<MentionAnalysis>,
    pub status: MentionStatus,
    /// Why the mention was skipped or failed.
    pub reason: Option<String>,
    pub reply_id: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Mention {
    /// Creates a pending mention for a freshly observed post.
    pub fn new_pending(
        account_id: impl Into<String>,
        post_id: impl Into<String>,
        author: MentionAuthor,
        content: impl Into<String>,
        media_urls: Vec<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            account_id: account_id.into(),
            post_id: post_id.into(),
            author,
            content: content.into(),
            media_urls,
            analysis: None,
            status: MentionStatus::Pending,
            reason: None,
            reply_id: None,
            received_at,
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: MentionStatus) -> Result<(), ThreadlyError> {
        if !self.status.can_transition_to(next) {
            return Err(ThreadlyError::InvalidState(format!(
                "mention {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Enters `processing`. From `failed` this is a retry and clears the
    /// previous outcome.
    pub fn begin_processing(&mut self) -> Result<(), ThreadlyError> {
        let retrying = self.status == MentionStatus::Failed;
        self.transition(MentionStatus::Processing)?;
        if retrying {
            self.reason = None;
            self.processed_at = None;
        }
        Ok(())
    }

    pub fn mark_replied(&mut self, reply_id: impl Into<String>) -> Result<(), ThreadlyError> {
        self.transition(MentionStatus::Replied)?;
        self.reply_id = Some(reply_id.into());
        self.reason = None;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_skipped(&mut self, reason: impl Into<String>) -> Result<(), ThreadlyError> {
        self.transition(MentionStatus::Skipped)?;
        self.reason = Some(reason.into());
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), ThreadlyError> {
        self.transition(MentionStatus::Failed)?;
        self.reason = Some(reason.into());
        self.processed_at = Some(Utc::now());
        Ok(())
    }
}

// --- Replies ---

/// Delivery state of a reply.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplyStatus {
    Pending,
    Sent,
    Failed,
}

/// A reply composed for a mention. At most one exists per mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub account_id: String,
    pub mention_id: String,
    pub template_id: Option<String>,
    pub content: String,
    pub status: ReplyStatus,
    pub threads_reply_id: Option<String>,
    pub provider_response: Option<serde_json::Value>,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new_pending(
        account_id: impl Into<String>,
        mention_id: impl Into<String>,
        template_id: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            account_id: account_id.into(),
            mention_id: mention_id.into(),
            template_id,
            content: content.into(),
            status: ReplyStatus::Pending,
            threads_reply_id: None,
            provider_response: None,
            error: None,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    /// Records a successful publish.
    pub fn mark_sent(&mut self, published: &PublishedReply) {
        self.status = ReplyStatus::Sent;
        self.threads_reply_id = Some(published.id.clone());
        self.provider_response = Some(published.raw.clone());
        self.error = None;
        self.sent_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = ReplyStatus::Failed;
        self.error = Some(error.into());
    }

    /// Replaces the body of a non-sent reply ahead of another delivery attempt.
    pub fn reset_for_retry(
        &mut self,
        template_id: Option<String>,
        content: impl Into<String>,
    ) -> Result<(), ThreadlyError> {
        if self.status == ReplyStatus::Sent {
            return Err(ThreadlyError::InvalidState(format!(
                "reply {} was already sent",
                self.id
            )));
        }
        self.template_id = template_id;
        self.content = content.into();
        self.status = ReplyStatus::Pending;
        self.error = None;
        Ok(())
    }
}

// --- Templates ---

/// Optional filters a template must satisfy beyond its mention type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConditions {
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Template only applies when sentiment is at or below this value.
    pub sentiment_threshold: Option<f64>,
}

/// An operator-authored reply template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub mention_type: MentionType,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<String>,
    pub is_active: bool,
    /// Lower values are preferred.
    pub priority: i32,
    pub conditions: Option<TemplateConditions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Priority assigned to templates created without an explicit value.
pub const DEFAULT_TEMPLATE_PRIORITY: i32 = 10;

impl Template {
    /// Creates an active template with default priority, recording the
    /// variables its body references.
    pub fn new(
        account_id: impl Into<String>,
        name: impl Into<String>,
        mention_type: MentionType,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let now = Utc::now();
        Self {
            id: new_id(),
            account_id: account_id.into(),
            name: name.into(),
            mention_type,
            variables: crate::template::extract_variables(&content),
            content,
            is_active: true,
            priority: DEFAULT_TEMPLATE_PRIORITY,
            conditions: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_conditions(mut self, conditions: TemplateConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks the template's conditions against an analysis.
    ///
    /// A template without conditions always matches. A sentiment threshold
    /// rejects analyses whose sentiment is above it. Keywords match as
    /// case-insensitive substrings of the raw classifier output, and any one
    /// keyword is enough.
    pub fn matches_conditions(&self, analysis: &MentionAnalysis) -> bool {
        let Some(conditions) = &self.conditions else {
            return true;
        };

        if conditions
            .sentiment_threshold
            .is_some_and(|threshold| analysis.sentiment > threshold)
        {
            return false;
        }

        if !conditions.keywords.is_empty() {
            let haystack = analysis.raw_analysis.to_lowercase();
            return conditions
                .keywords
                .iter()
                .any(|k| haystack.contains(&k.to_lowercase()));
        }

        true
    }
}

// --- Accounts ---

/// Per-account tuning for the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub reply_delay_seconds: u64,
    pub max_replies_per_hour: u32,
    #[serde(default)]
    pub ignore_verified_accounts: bool,
    #[serde(default)]
    pub ignore_keywords: Vec<String>,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            reply_delay_seconds: 30,
            max_replies_per_hour: 50,
            ignore_verified_accounts: false,
            ignore_keywords: Vec::new(),
        }
    }
}

/// An encrypted platform access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Hex-encoded AES-256-GCM ciphertext.
    pub sealed_token: String,
    /// Hex-encoded 12-byte nonce.
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// A managed social-media account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// Platform-assigned user id, used to route webhooks.
    pub platform_user_id: String,
    pub username: String,
    pub display_name: String,
    pub auto_reply_enabled: bool,
    pub settings: AccountSettings,
    pub credential: Option<StoredCredential>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(platform_user_id: impl Into<String>, username: impl Into<String>) -> Self {
        let username = username.into();
        let now = Utc::now();
        Self {
            id: new_id(),
            platform_user_id: platform_user_id.into(),
            display_name: username.clone(),
            username,
            auto_reply_enabled: true,
            settings: AccountSettings::default(),
            credential: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- Platform payloads ---

/// A mention normalized from a webhook delivery or a reconciliation pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionEvent {
    /// Platform user id of the mentioned (managed) account.
    pub account_platform_id: String,
    pub author: MentionAuthor,
    /// Platform id of the post that contains the mention.
    pub post_id: String,
    pub text: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One of the account's own posts, as listed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPost {
    pub id: String,
    pub text: Option<String>,
    pub username: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A reply to one of the account's posts, as listed by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformReply {
    pub id: String,
    pub text: Option<String>,
    pub username: String,
    pub user_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Outcome of a successful reply publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedReply {
    /// Platform id of the published reply.
    pub id: String,
    /// Raw publish response body.
    pub raw: serde_json::Value,
}

/// A refreshed long-lived platform token.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: secrecy::SecretString,
    pub expires_in: std::time::Duration,
}
