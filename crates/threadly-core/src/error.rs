// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Threadly mention pipeline.

use thiserror::Error;

/// The primary error type used across all Threadly adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ThreadlyError {
    /// Configuration errors (invalid TOML, missing required fields, bad key material).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record with the same natural key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The requested record does not exist (or an update matched no row).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// AI classification/generation service errors.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Social platform API errors (reply delivery, post listing, token refresh).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Delivery credential could not be resolved, decrypted, or refreshed.
    #[error("credential error: {0}")]
    Credential(String),

    /// An inbound payload could not be parsed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The record exists but belongs to a different account.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested operation is not allowed in the record's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ThreadlyError {
    /// Returns `true` for a uniqueness-constraint rejection.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ThreadlyError::Duplicate { .. })
    }

    /// Returns `true` when the target record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ThreadlyError::NotFound { .. })
    }
}
