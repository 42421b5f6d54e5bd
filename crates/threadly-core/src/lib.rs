// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Threadly mention pipeline.
//!
//! This crate provides the domain types, error taxonomy, template rendering,
//! and adapter traits shared across the Threadly workspace. Every adapter
//! (storage, analyzer, platform, credential) implements traits defined here.

pub mod error;
pub mod template;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ThreadlyError;
pub use template::TemplateVariables;
pub use types::{
    Account, AccountSettings, HealthStatus, Mention, MentionAnalysis, MentionAuthor,
    MentionEvent, MentionStatus, MentionType, PlatformPost, PlatformReply, PublishedReply,
    RefreshedToken, Reply, ReplyStatus, StoredCredential, Template, TemplateConditions,
};

pub use traits::{
    AccountRepository, AnalyzerAdapter, CredentialProvider, GenerateRequest, MentionRepository,
    PlatformAdapter, ReplyRepository, StorageAdapter, TemplateRepository,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_helpers_classify_variants() {
        let dup = ThreadlyError::Duplicate {
            entity: "mention",
            key: "acct/post".into(),
        };
        assert!(dup.is_duplicate());
        assert_eq!(dup.to_string(), "duplicate mention: acct/post");

        let missing = ThreadlyError::NotFound {
            entity: "account",
            id: "a1".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_duplicate());

        let storage = ThreadlyError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(storage.to_string(), "storage error: disk full");
    }
}
