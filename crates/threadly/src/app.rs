// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the pipeline and its collaborators from configuration.

use std::sync::Arc;

use threadly_config::ThreadlyConfig;
use threadly_core::{StorageAdapter, ThreadlyError};
use threadly_openai::OpenAiAnalyzer;
use threadly_pipeline::{MentionPipeline, PipelineDeps, PipelineSettings};
use threadly_storage::SqliteStorage;
use threadly_threads::ThreadsPlatform;
use threadly_vault::{TokenVault, VaultCredentialProvider};
use tracing::{error, info};

pub struct App {
    pub pipeline: Arc<MentionPipeline>,
    pub storage: Arc<SqliteStorage>,
}

pub async fn build(config: &ThreadlyConfig) -> Result<App, ThreadlyError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let platform = Arc::new(ThreadsPlatform::new(&config.threads)?);

    let analyzer = Arc::new(OpenAiAnalyzer::new(&config.openai).map_err(|e| {
        error!(error = %e, "failed to initialize OpenAI analyzer");
        eprintln!("error: OpenAI API key required. Set openai.api_key or OPENAI_API_KEY.");
        e
    })?);

    let key = config
        .vault
        .encryption_key
        .as_deref()
        .ok_or_else(|| ThreadlyError::Config("vault.encryption_key is required".to_string()))?;
    let credentials = Arc::new(VaultCredentialProvider::new(
        storage.clone(),
        platform.clone(),
        TokenVault::from_hex(key)?,
    ));

    let deps = PipelineDeps {
        mentions: storage.clone(),
        replies: storage.clone(),
        templates: storage.clone(),
        accounts: storage.clone(),
        analyzer,
        platform,
        credentials,
    };
    let settings = PipelineSettings::from_config(config);
    info!(
        max_concurrent = settings.max_concurrent_continuations,
        "pipeline ready"
    );

    Ok(App {
        pipeline: Arc::new(MentionPipeline::new(deps, settings)),
        storage,
    })
}
