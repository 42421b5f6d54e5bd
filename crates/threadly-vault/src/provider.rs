// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential resolution: decrypt the stored token, refreshing it first when expired.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use threadly_core::{AccountRepository, CredentialProvider, PlatformAdapter, ThreadlyError};
use tracing::{info, warn};

use crate::token::TokenVault;

/// Resolves account tokens from sealed credentials stored on the account.
pub struct VaultCredentialProvider {
    accounts: Arc<dyn AccountRepository>,
    platform: Arc<dyn PlatformAdapter>,
    vault: TokenVault,
}

impl VaultCredentialProvider {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        platform: Arc<dyn PlatformAdapter>,
        vault: TokenVault,
    ) -> Self {
        Self {
            accounts,
            platform,
            vault,
        }
    }

    /// Seals `token` and stores it on the account, replacing any previous credential.
    pub async fn store_token(
        &self,
        account_id: &str,
        token: &SecretString,
        expires_in: std::time::Duration,
    ) -> Result<(), ThreadlyError> {
        let mut account = self.accounts.get_account(account_id).await?.ok_or_else(|| {
            ThreadlyError::NotFound {
                entity: "account",
                id: account_id.to_string(),
            }
        })?;
        let expires_at = Utc::now()
            + chrono::Duration::from_std(expires_in)
                .map_err(|e| ThreadlyError::Credential(format!("invalid token lifetime: {e}")))?;
        account.credential = Some(self.vault.seal_token(&account.id, token, expires_at)?);
        self.accounts.update_account(&account).await
    }
}

#[async_trait]
impl CredentialProvider for VaultCredentialProvider {
    async fn get_valid_access_token(
        &self,
        account_id: &str,
    ) -> Result<SecretString, ThreadlyError> {
        let account = self
            .accounts
            .get_account(account_id)
            .await?
            .ok_or_else(|| ThreadlyError::Credential(format!("unknown account {account_id}")))?;
        let credential = account.credential.as_ref().ok_or_else(|| {
            ThreadlyError::Credential(format!("account {account_id} has no stored token"))
        })?;

        let token = self.vault.open_token(&account.id, credential)?;
        if credential.expires_at > Utc::now() {
            return Ok(token);
        }

        info!(account_id, "access token expired, refreshing");
        let refreshed = self.platform.refresh_token(&token).await.map_err(|e| {
            warn!(account_id, error = %e, "token refresh failed");
            ThreadlyError::Credential(format!("token expired and refresh failed: {e}"))
        })?;
        self.store_token(&account.id, &refreshed.access_token, refreshed.expires_in)
            .await?;
        Ok(refreshed.access_token)
    }
}
