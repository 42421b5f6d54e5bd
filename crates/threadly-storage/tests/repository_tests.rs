// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository contract tests against a real SQLite file.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use threadly_config::model::StorageConfig;
use threadly_core::{
    Account, AccountRepository, Mention, MentionAnalysis, MentionAuthor, MentionRepository,
    MentionStatus, MentionType, PublishedReply, Reply, ReplyRepository, ReplyStatus,
    StorageAdapter, StoredCredential, Template, TemplateConditions, TemplateRepository,
};
use threadly_storage::SqliteStorage;

async fn storage() -> (TempDir, SqliteStorage, Account) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threadly.db");
    let storage = SqliteStorage::new(StorageConfig {
        database_path: path.to_str().unwrap().to_string(),
        wal_mode: true,
    });
    storage.initialize().await.unwrap();

    let account = Account::new("17841400000", "brand");
    storage.create_account(&account).await.unwrap();
    (dir, storage, account)
}

fn mention(account: &Account, post_id: &str) -> Mention {
    Mention::new_pending(
        &account.id,
        post_id,
        MentionAuthor::new("u-1", "alice", None, false),
        "hello @brand",
        vec!["https://cdn.example/img.png".into()],
        Utc::now(),
    )
}

fn analysis() -> MentionAnalysis {
    MentionAnalysis {
        mention_type: MentionType::Question,
        sentiment: 0.2,
        intent: "ask".into(),
        urgency: "low".into(),
        keywords: vec!["pricing".into()],
        suggested_tone: "friendly".into(),
        raw_analysis: r#"{"mention_type":"question"}"#.into(),
    }
}

#[tokio::test]
async fn mention_round_trip_and_lookup_by_post() {
    let (_dir, storage, account) = storage().await;
    let mut m = mention(&account, "post-1");
    storage.create_mention(&m).await.unwrap();

    let loaded = storage.get_mention(&m.id).await.unwrap().unwrap();
    assert_eq!(loaded.post_id, "post-1");
    assert_eq!(loaded.author.display_name, "alice");
    assert_eq!(loaded.media_urls.len(), 1);
    assert_eq!(loaded.status, MentionStatus::Pending);

    m.begin_processing().unwrap();
    m.analysis = Some(analysis());
    storage.update_mention(&m).await.unwrap();

    let by_post = storage
        .get_mention_by_post_id(&account.id, "post-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_post.id, m.id);
    assert_eq!(by_post.status, MentionStatus::Processing);
    assert_eq!(by_post.analysis, Some(analysis()));

    assert!(
        storage
            .get_mention_by_post_id(&account.id, "post-2")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_post_is_rejected_as_duplicate() {
    let (_dir, storage, account) = storage().await;
    storage.create_mention(&mention(&account, "post-1")).await.unwrap();

    let err = storage
        .create_mention(&mention(&account, "post-1"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate(), "got {err}");

    let all = storage
        .list_mentions(&account.id, 100, 0, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let (_dir, storage, account) = storage().await;
    let err = storage
        .update_mention(&mention(&account, "ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn count_replied_since_respects_window_and_status() {
    let (_dir, storage, account) = storage().await;

    for (i, status) in [
        MentionStatus::Replied,
        MentionStatus::Replied,
        MentionStatus::Skipped,
    ]
    .into_iter()
    .enumerate()
    {
        let mut m = mention(&account, &format!("post-{i}"));
        m.status = status;
        m.processed_at = Some(Utc::now());
        storage.create_mention(&m).await.unwrap();
    }

    let mut old = mention(&account, "old");
    old.status = MentionStatus::Replied;
    old.processed_at = Some(Utc::now() - Duration::hours(2));
    storage.create_mention(&old).await.unwrap();

    let since = Utc::now() - Duration::hours(1);
    assert_eq!(storage.count_replied_since(&account.id, since).await.unwrap(), 2);
}

#[tokio::test]
async fn list_filters_by_status_and_paginates() {
    let (_dir, storage, account) = storage().await;
    for i in 0..5 {
        let mut m = mention(&account, &format!("post-{i}"));
        m.received_at = Utc::now() + Duration::seconds(i);
        if i % 2 == 0 {
            m.status = MentionStatus::Skipped;
        }
        storage.create_mention(&m).await.unwrap();
    }

    let page = storage.list_mentions(&account.id, 2, 0, None).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].post_id, "post-4");

    let skipped = storage
        .list_mentions(&account.id, 10, 0, Some(MentionStatus::Skipped))
        .await
        .unwrap();
    assert_eq!(skipped.len(), 3);
}

#[tokio::test]
async fn reply_is_unique_per_mention() {
    let (_dir, storage, account) = storage().await;
    let m = mention(&account, "post-1");
    storage.create_mention(&m).await.unwrap();

    let mut reply = Reply::new_pending(&account.id, &m.id, None, "thanks!");
    storage.create_reply(&reply).await.unwrap();

    let err = storage
        .create_reply(&Reply::new_pending(&account.id, &m.id, None, "again"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());

    reply.mark_sent(&PublishedReply {
        id: "R123".into(),
        raw: serde_json::json!({"id": "R123"}),
    });
    storage.update_reply(&reply).await.unwrap();

    let loaded = storage.get_reply_by_mention(&m.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ReplyStatus::Sent);
    assert_eq!(loaded.threads_reply_id.as_deref(), Some("R123"));
    assert_eq!(loaded.provider_response, Some(serde_json::json!({"id": "R123"})));
    assert!(loaded.sent_at.is_some());

    let listed = storage.list_replies(&account.id, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn active_templates_are_ordered_by_priority() {
    let (_dir, storage, account) = storage().await;

    let low = Template::new(&account.id, "low", MentionType::Complaint, "Sorry {{username}}")
        .with_priority(5);
    let high = Template::new(&account.id, "high", MentionType::Complaint, "We hear you")
        .with_priority(1)
        .with_conditions(TemplateConditions {
            keywords: vec![],
            sentiment_threshold: Some(0.0),
        });
    let inactive =
        Template::new(&account.id, "off", MentionType::Complaint, "Nope").inactive();
    let other_type = Template::new(&account.id, "q", MentionType::Question, "Good question");
    for t in [&low, &high, &inactive, &other_type] {
        storage.create_template(t).await.unwrap();
    }

    let active = storage
        .list_active_templates(&account.id, MentionType::Complaint)
        .await
        .unwrap();
    let names: Vec<&str> = active.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["high", "low"]);
    assert_eq!(active[0].conditions, high.conditions);
    assert_eq!(active[1].variables, vec!["username".to_string()]);

    assert_eq!(storage.list_templates(&account.id).await.unwrap().len(), 4);
    assert!(storage.get_template(&low.id).await.unwrap().is_some());
}

#[tokio::test]
async fn account_lookup_and_credential_update() {
    let (_dir, storage, mut account) = storage().await;

    let found = storage
        .get_account_by_platform_user_id("17841400000")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, account.id);
    assert!(found.credential.is_none());
    assert!(found.auto_reply_enabled);
    assert_eq!(found.settings.max_replies_per_hour, 50);

    account.credential = Some(StoredCredential {
        sealed_token: "deadbeef".into(),
        nonce: "00".repeat(12),
        expires_at: Utc::now() + Duration::days(30),
    });
    account.settings.ignore_keywords = vec!["giveaway".into()];
    storage.update_account(&account).await.unwrap();

    let reloaded = storage.get_account(&account.id).await.unwrap().unwrap();
    assert_eq!(reloaded.credential.unwrap().sealed_token, "deadbeef");
    assert_eq!(reloaded.settings.ignore_keywords, vec!["giveaway".to_string()]);

    let dup = Account::new("17841400000", "brand-copy");
    assert!(storage.create_account(&dup).await.unwrap_err().is_duplicate());
}
