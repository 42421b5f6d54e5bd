// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;
use threadly_core::{CredentialProvider, ThreadlyError};

pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Hands out a fixed token, or a configured error.
pub struct MockCredentials {
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockCredentials {
    pub fn new() -> Self {
        Self {
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for MockCredentials {
    async fn get_valid_access_token(
        &self,
        _account_id: &str,
    ) -> Result<SecretString, ThreadlyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match failure {
            Some(message) => Err(ThreadlyError::Credential(message)),
            None => Ok(SecretString::from(MOCK_ACCESS_TOKEN)),
        }
    }
}
