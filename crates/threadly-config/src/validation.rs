// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ThreadlyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ThreadlyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.server.max_concurrent_continuations == 0 {
        fail("server.max_concurrent_continuations must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.openai.max_tokens == 0 {
        fail("openai.max_tokens must be at least 1".to_string());
    }

    for (key, url) in [
        ("threads.graph_base_url", &config.threads.graph_base_url),
        ("openai.base_url", &config.openai.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!("{key} must be an http(s) URL, got `{url}`"));
        }
    }

    if config.reconcile.lookback_hours == 0 {
        fail("reconcile.lookback_hours must be at least 1".to_string());
    }
    if !(1..=100).contains(&config.reconcile.max_posts) {
        fail(format!(
            "reconcile.max_posts must be between 1 and 100, got {}",
            config.reconcile.max_posts
        ));
    }

    if let Some(key) = &config.vault.encryption_key {
        match hex::decode(key.trim()) {
            Ok(bytes) if bytes.len() == 32 => {}
            Ok(bytes) => fail(format!(
                "vault.encryption_key must decode to 32 bytes, got {}",
                bytes.len()
            )),
            Err(_) => fail("vault.encryption_key must be hex-encoded".to_string()),
        }
    }

    if !LOG_LEVELS.contains(&config.log.level.to_lowercase().as_str()) {
        fail(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks the settings `serve` cannot run without.
pub fn validate_for_serve(config: &ThreadlyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    for (key, value) in [
        ("threads.app_secret", &config.threads.app_secret),
        ("threads.verify_token", &config.threads.verify_token),
        ("vault.encryption_key", &config.vault.encryption_key),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::MissingKey {
                key: key.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ThreadlyConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ThreadlyConfig::default();
        config.storage.database_path = " ".into();
        config.openai.max_tokens = 0;
        config.reconcile.lookback_hours = 0;
        config.vault.encryption_key = Some("abcd".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn serve_requires_secrets() {
        let errors = validate_for_serve(&ThreadlyConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ConfigError::MissingKey { .. })));
    }
}
