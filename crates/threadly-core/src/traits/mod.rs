// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Threadly pipeline.

pub mod analyzer;
pub mod credential;
pub mod platform;
pub mod repository;

pub use analyzer::{AnalyzerAdapter, GenerateRequest};
pub use credential::CredentialProvider;
pub use platform::PlatformAdapter;
pub use repository::{
    AccountRepository, MentionRepository, ReplyRepository, StorageAdapter, TemplateRepository,
};
