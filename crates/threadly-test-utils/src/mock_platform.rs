// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock social platform that records deliveries and serves canned listings.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use threadly_core::{
    PlatformAdapter, PlatformPost, PlatformReply, PublishedReply, RefreshedToken, ThreadlyError,
};

/// One `create_reply` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub token: String,
    pub account_platform_id: String,
    pub text: String,
    pub in_reply_to: String,
}

#[derive(Default)]
struct State {
    sent: Vec<SentReply>,
    publish_results: VecDeque<Result<String, String>>,
    posts: Vec<PlatformPost>,
    replies: HashMap<String, Vec<PlatformReply>>,
    failing_posts: HashSet<String>,
    list_posts_error: Option<String>,
    refresh_result: Option<Result<RefreshedToken, String>>,
    refresh_calls: usize,
    post_queries: Vec<(DateTime<Utc>, u32)>,
}

#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<State>,
}

fn platform_error(message: String) -> ThreadlyError {
    ThreadlyError::Platform {
        message,
        source: None,
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues the remote id returned by the next successful publish.
    pub fn push_publish_id(&self, id: impl Into<String>) {
        self.lock().publish_results.push_back(Ok(id.into()));
    }

    pub fn push_publish_error(&self, message: impl Into<String>) {
        self.lock().publish_results.push_back(Err(message.into()));
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.lock().sent.clone()
    }

    pub fn add_post(&self, id: impl Into<String>) {
        self.lock().posts.push(PlatformPost {
            id: id.into(),
            text: None,
            username: None,
            timestamp: Some(Utc::now()),
        });
    }

    /// Adds a reply by `username` under `post_id`.
    pub fn add_reply(
        &self,
        post_id: &str,
        reply_id: impl Into<String>,
        username: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.lock()
            .replies
            .entry(post_id.to_string())
            .or_default()
            .push(PlatformReply {
                id: reply_id.into(),
                text: Some(text.into()),
                username: username.into(),
                user_id: None,
                timestamp: Some(Utc::now()),
                media_urls: vec![],
            });
    }

    /// Makes `list_replies` fail for `post_id`.
    pub fn fail_replies_for(&self, post_id: impl Into<String>) {
        self.lock().failing_posts.insert(post_id.into());
    }

    pub fn fail_list_posts(&self, message: impl Into<String>) {
        self.lock().list_posts_error = Some(message.into());
    }

    /// The `(since, limit)` window of every `list_own_posts` call.
    pub fn post_queries(&self) -> Vec<(DateTime<Utc>, u32)> {
        self.lock().post_queries.clone()
    }

    pub fn set_refresh_result(&self, result: Result<RefreshedToken, String>) {
        self.lock().refresh_result = Some(result);
    }

    pub fn refresh_calls(&self) -> usize {
        self.lock().refresh_calls
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    async fn create_reply(
        &self,
        token: &SecretString,
        account_platform_id: &str,
        text: &str,
        in_reply_to: &str,
    ) -> Result<PublishedReply, ThreadlyError> {
        let mut state = self.lock();
        let result = state
            .publish_results
            .pop_front()
            .unwrap_or_else(|| Ok(format!("remote-{}", state.sent.len() + 1)));
        let id = result.map_err(platform_error)?;
        state.sent.push(SentReply {
            token: token.expose_secret().to_string(),
            account_platform_id: account_platform_id.to_string(),
            text: text.to_string(),
            in_reply_to: in_reply_to.to_string(),
        });
        Ok(PublishedReply {
            raw: serde_json::json!({ "id": id }),
            id,
        })
    }

    async fn list_own_posts(
        &self,
        _token: &SecretString,
        _account_platform_id: &str,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PlatformPost>, ThreadlyError> {
        let mut state = self.lock();
        state.post_queries.push((since, limit));
        if let Some(message) = state.list_posts_error.clone() {
            return Err(platform_error(message));
        }
        Ok(state.posts.iter().take(limit as usize).cloned().collect())
    }

    async fn list_replies(
        &self,
        _token: &SecretString,
        post_id: &str,
    ) -> Result<Vec<PlatformReply>, ThreadlyError> {
        let state = self.lock();
        if state.failing_posts.contains(post_id) {
            return Err(platform_error(format!("replies unavailable for {post_id}")));
        }
        Ok(state.replies.get(post_id).cloned().unwrap_or_default())
    }

    async fn refresh_token(&self, _token: &SecretString) -> Result<RefreshedToken, ThreadlyError> {
        let mut state = self.lock();
        state.refresh_calls += 1;
        match state.refresh_result.clone() {
            Some(result) => result.map_err(platform_error),
            None => Err(platform_error("refresh not configured".into())),
        }
    }
}
