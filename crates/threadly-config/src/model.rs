// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Threadly mention pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Threadly configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadlyConfig {
    /// HTTP server and continuation scheduling.
    #[serde(default)]
    pub server: ServerConfig,

    /// Threads platform credentials and endpoints.
    #[serde(default)]
    pub threads: ThreadsConfig,

    /// OpenAI classifier settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Token vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Reconciliation pull settings.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the operator API. `None` rejects every operator request.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Upper bound on concurrently running mention continuations.
    #[serde(default = "default_max_concurrent_continuations")]
    pub max_concurrent_continuations: usize,

    /// How long shutdown waits for in-flight continuations.
    #[serde(default = "default_shutdown_drain_secs")]
    pub shutdown_drain_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            max_concurrent_continuations: default_max_concurrent_continuations(),
            shutdown_drain_secs: default_shutdown_drain_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_concurrent_continuations() -> usize {
    32
}

fn default_shutdown_drain_secs() -> u64 {
    30
}

/// Threads platform configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadsConfig {
    #[serde(default)]
    pub app_id: Option<String>,

    /// Shared secret used to sign webhook deliveries.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Token echoed back during the subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            verify_token: None,
            graph_base_url: default_graph_base_url(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_graph_base_url() -> String {
    "https://graph.threads.net".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Token ceiling for classification requests.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            base_url: default_openai_base_url(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("threadly").join("threadly.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("threadly.db"))
        .display()
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Token vault configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Hex-encoded 32-byte AES-256-GCM key for sealing platform tokens.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

/// Reconciliation pull configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// How far back to look for the account's own posts.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,

    /// Maximum number of own posts scanned per pull.
    #[serde(default = "default_max_posts")]
    pub max_posts: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            max_posts: default_max_posts(),
        }
    }
}

fn default_lookback_hours() -> u32 {
    24
}

fn default_max_posts() -> u32 {
    25
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
