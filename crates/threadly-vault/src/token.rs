// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealing of platform access tokens for storage on an account record.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use threadly_core::{StoredCredential, ThreadlyError};
use zeroize::Zeroizing;

use crate::crypto;

/// Holds the token encryption key and seals/opens account credentials.
pub struct TokenVault {
    key: Zeroizing<[u8; 32]>,
}

impl TokenVault {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Builds a vault from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> Result<Self, ThreadlyError> {
        let bytes = Zeroizing::new(
            hex::decode(hex_key.trim())
                .map_err(|e| ThreadlyError::Config(format!("vault key is not valid hex: {e}")))?,
        );
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ThreadlyError::Config(format!(
                "vault key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Encrypts `token` for `account_id`.
    pub fn seal_token(
        &self,
        account_id: &str,
        token: &SecretString,
        expires_at: DateTime<Utc>,
    ) -> Result<StoredCredential, ThreadlyError> {
        let (ciphertext, nonce) = crypto::seal(
            &self.key,
            account_id.as_bytes(),
            token.expose_secret().as_bytes(),
        )?;
        Ok(StoredCredential {
            sealed_token: hex::encode(ciphertext),
            nonce: hex::encode(nonce),
            expires_at,
        })
    }

    /// Decrypts a stored credential belonging to `account_id`.
    pub fn open_token(
        &self,
        account_id: &str,
        credential: &StoredCredential,
    ) -> Result<SecretString, ThreadlyError> {
        let ciphertext = hex::decode(&credential.sealed_token)
            .map_err(|_| ThreadlyError::Credential("sealed token is not valid hex".to_string()))?;
        let nonce: [u8; 12] = hex::decode(&credential.nonce)
            .ok()
            .and_then(|n| n.try_into().ok())
            .ok_or_else(|| ThreadlyError::Credential("token nonce is malformed".to_string()))?;

        let plaintext = Zeroizing::new(crypto::open(
            &self.key,
            account_id.as_bytes(),
            &nonce,
            &ciphertext,
        )?);
        let token = std::str::from_utf8(&plaintext)
            .map_err(|_| ThreadlyError::Credential("token is not valid UTF-8".to_string()))?;
        Ok(SecretString::from(token.to_owned()))
    }
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}
