// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./threadly.toml` > `~/.config/threadly/threadly.toml` >
//! `/etc/threadly/threadly.toml` with environment variable overrides via `THREADLY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ThreadlyConfig;

/// Top-level sections an environment variable may address.
const SECTIONS: &[&str] = &[
    "server",
    "threads",
    "openai",
    "storage",
    "vault",
    "reconcile",
    "log",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/threadly/threadly.toml` (system-wide)
/// 3. `~/.config/threadly/threadly.toml` (user XDG config)
/// 4. `./threadly.toml` (local directory)
/// 5. `THREADLY_*` environment variables
pub fn load_config() -> Result<ThreadlyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ThreadlyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ThreadlyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ThreadlyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ThreadlyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ThreadlyConfig::default()))
        .merge(Toml::file("/etc/threadly/threadly.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("threadly/threadly.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("threadly.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `THREADLY_THREADS_APP_SECRET` maps to `threads.app_secret`.
fn env_provider() -> Env {
    Env::prefixed("THREADLY_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
