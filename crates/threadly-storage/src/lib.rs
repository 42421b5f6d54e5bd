// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Threadly mention pipeline.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the repository operations the
//! pipeline relies on. Uniqueness of (account, post) for mentions and of
//! mention for replies is enforced by the schema and surfaced as
//! [`threadly_core::ThreadlyError::Duplicate`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
