// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classifier for deterministic pipeline tests.
//!
//! Analyses and generated replies are popped from FIFO queues. When a queue
//! is empty a neutral analysis or a fixed reply text is returned.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use threadly_core::{
    AnalyzerAdapter, GenerateRequest, MentionAnalysis, MentionAuthor, MentionType, ThreadlyError,
};

pub const DEFAULT_GENERATED_REPLY: &str = "Thanks for reaching out!";

/// Builds an analysis with the given type and sentiment.
pub fn analysis(mention_type: MentionType, sentiment: f64) -> MentionAnalysis {
    MentionAnalysis {
        mention_type,
        sentiment,
        intent: "general_comment".into(),
        urgency: "low".into(),
        keywords: vec![],
        suggested_tone: "friendly".into(),
        raw_analysis: format!(
            r#"{{"mention_type":"{mention_type}","sentiment":{sentiment}}}"#
        ),
    }
}

#[derive(Default)]
struct State {
    analyses: VecDeque<Result<MentionAnalysis, String>>,
    replies: VecDeque<Result<String, String>>,
    analyzed: Vec<String>,
    generated: Vec<GenerateRequest>,
}

#[derive(Default)]
pub struct MockAnalyzer {
    state: Mutex<State>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_analysis(&self, analysis: MentionAnalysis) {
        self.lock().analyses.push_back(Ok(analysis));
    }

    pub fn push_analysis_error(&self, message: impl Into<String>) {
        self.lock().analyses.push_back(Err(message.into()));
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.lock().replies.push_back(Ok(text.into()));
    }

    pub fn push_reply_error(&self, message: impl Into<String>) {
        self.lock().replies.push_back(Err(message.into()));
    }

    /// Number of `analyze` calls so far.
    pub fn analyze_calls(&self) -> usize {
        self.lock().analyzed.len()
    }

    pub fn generate_calls(&self) -> usize {
        self.lock().generated.len()
    }

    /// Requests seen by `generate_reply`, oldest first.
    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.lock().generated.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AnalyzerAdapter for MockAnalyzer {
    async fn analyze(
        &self,
        text: &str,
        _author: &MentionAuthor,
    ) -> Result<MentionAnalysis, ThreadlyError> {
        let mut state = self.lock();
        state.analyzed.push(text.to_string());
        match state.analyses.pop_front() {
            Some(Ok(a)) => Ok(a),
            Some(Err(message)) => Err(ThreadlyError::Provider {
                message,
                source: None,
            }),
            None => Ok(analysis(MentionType::Neutral, 0.0)),
        }
    }

    async fn generate_reply(&self, request: GenerateRequest) -> Result<String, ThreadlyError> {
        let mut state = self.lock();
        state.generated.push(request);
        match state.replies.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ThreadlyError::Provider {
                message,
                source: None,
            }),
            None => Ok(DEFAULT_GENERATED_REPLY.to_string()),
        }
    }
}
