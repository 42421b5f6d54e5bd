// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM sealing of platform access tokens and the credential provider
//! the pipeline uses to obtain a valid token before delivery.

pub mod crypto;
pub mod provider;
pub mod token;

pub use provider::VaultCredentialProvider;
pub use token::TokenVault;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use secrecy::{ExposeSecret, SecretString};
    use threadly_core::{Account, AccountRepository, CredentialProvider, RefreshedToken};
    use threadly_test_utils::{MemoryStore, MockPlatform};

    use super::*;

    const KEY: &str = "1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100";

    async fn setup(
        expires_in: chrono::Duration,
    ) -> (Arc<MemoryStore>, Arc<MockPlatform>, VaultCredentialProvider, Account) {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(MockPlatform::new());
        let vault = TokenVault::from_hex(KEY).unwrap();

        let mut account = Account::new("pid-1", "brand");
        account.credential = Some(
            vault
                .seal_token(&account.id, &SecretString::from("old-token"), Utc::now() + expires_in)
                .unwrap(),
        );
        store.create_account(&account).await.unwrap();

        let provider = VaultCredentialProvider::new(store.clone(), platform.clone(), vault);
        (store, platform, provider, account)
    }

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let (_store, platform, provider, account) = setup(chrono::Duration::days(10)).await;
        let token = provider.get_valid_access_token(&account.id).await.unwrap();
        assert_eq!(token.expose_secret(), "old-token");
        assert_eq!(platform.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let (store, platform, provider, account) = setup(chrono::Duration::seconds(-5)).await;
        platform.set_refresh_result(Ok(RefreshedToken {
            access_token: SecretString::from("new-token"),
            expires_in: Duration::from_secs(60 * 60 * 24 * 60),
        }));

        let token = provider.get_valid_access_token(&account.id).await.unwrap();
        assert_eq!(token.expose_secret(), "new-token");
        assert_eq!(platform.refresh_calls(), 1);

        let stored = store.get_account(&account.id).await.unwrap().unwrap();
        assert!(stored.credential.unwrap().expires_at > Utc::now());

        // The refreshed token is now served without another refresh.
        let again = provider.get_valid_access_token(&account.id).await.unwrap();
        assert_eq!(again.expose_secret(), "new-token");
        assert_eq!(platform.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn missing_credential_is_a_credential_error() {
        let store = Arc::new(MemoryStore::new());
        let account = Account::new("pid-2", "nocred");
        store.create_account(&account).await.unwrap();
        let provider = VaultCredentialProvider::new(
            store,
            Arc::new(MockPlatform::new()),
            TokenVault::from_hex(KEY).unwrap(),
        );

        let err = provider
            .get_valid_access_token(&account.id)
            .await
            .unwrap_err();
        assert!(matches!(err, threadly_core::ThreadlyError::Credential(_)));
    }
}
