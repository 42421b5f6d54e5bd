// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Threadly.
//!
//! Provides in-memory and mock adapters so pipeline, vault and gateway
//! tests run without a database or network.
//!
//! # Components
//!
//! - [`MemoryStore`] - All repository traits over in-memory tables
//! - [`MockAnalyzer`] - Queued classifier and generator responses
//! - [`MockPlatform`] - Records deliveries, serves canned posts and replies
//! - [`MockCredentials`] - Fixed access token or configured failure
//! - [`PipelineHarness`] - A pipeline wired to all of the above
//! - [`sign_payload`] - Webhook signatures for simulated deliveries

pub mod harness;
pub mod memory_store;
pub mod mock_analyzer;
pub mod mock_credentials;
pub mod mock_platform;
pub mod webhook;

pub use harness::{ACCOUNT_PLATFORM_ID, ACCOUNT_USERNAME, PipelineHarness, PipelineHarnessBuilder};
pub use memory_store::{FailPoint, MemoryStore};
pub use mock_analyzer::{DEFAULT_GENERATED_REPLY, MockAnalyzer, analysis};
pub use mock_credentials::{MOCK_ACCESS_TOKEN, MockCredentials};
pub use mock_platform::{MockPlatform, SentReply};
pub use webhook::sign_payload;
