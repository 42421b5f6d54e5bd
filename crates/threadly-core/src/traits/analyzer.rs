// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analyzer adapter trait for AI classification and reply generation.

use async_trait::async_trait;

use crate::error::ThreadlyError;
use crate::types::{MentionAnalysis, MentionAuthor};

/// Input to reply generation.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub text: String,
    pub author: MentionAuthor,
    pub analysis: MentionAnalysis,
    /// Optional steering text, e.g. a template body to paraphrase.
    pub hint: Option<String>,
}

#[async_trait]
pub trait AnalyzerAdapter: Send + Sync {
    /// Classifies a mention's text.
    async fn analyze(
        &self,
        text: &str,
        author: &MentionAuthor,
    ) -> Result<MentionAnalysis, ThreadlyError>;

    /// Produces a short reply for a mention.
    async fn generate_reply(&self, request: GenerateRequest) -> Result<String, ThreadlyError>;
}
