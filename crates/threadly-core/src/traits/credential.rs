// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential provider trait.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ThreadlyError;

/// Resolves a usable platform access token for an account.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a token that is valid now, refreshing it first if it expired.
    async fn get_valid_access_token(&self, account_id: &str)
    -> Result<SecretString, ThreadlyError>;
}
