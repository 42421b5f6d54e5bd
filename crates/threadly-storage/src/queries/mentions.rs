// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mention CRUD operations.

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use threadly_core::{Mention, MentionAuthor, MentionStatus, ThreadlyError};

use super::{fmt_opt_ts, fmt_ts, from_json, from_opt_json, parse_enum, parse_opt_ts, parse_ts, to_json, to_opt_json};
use crate::database::{Database, is_unique_violation, map_tr_err};

const COLUMNS: &str = "id, account_id, post_id, author_id, author_username, author_display_name, \
     author_verified, content, media_urls, analysis, status, reason, reply_id, received_at, \
     processed_at, created_at";

fn row_to_mention(row: &Row<'_>) -> rusqlite::Result<Mention> {
    let media_urls: String = row.get(8)?;
    let status: String = row.get(10)?;
    let received_at: String = row.get(13)?;
    let created_at: String = row.get(15)?;
    Ok(Mention {
        id: row.get(0)?,
        account_id: row.get(1)?,
        post_id: row.get(2)?,
        author: MentionAuthor {
            platform_user_id: row.get(3)?,
            username: row.get(4)?,
            display_name: row.get(5)?,
            verified: row.get(6)?,
        },
        content: row.get(7)?,
        media_urls: from_json(8, &media_urls)?,
        analysis: from_opt_json(9, row.get(9)?)?,
        status: parse_enum(10, &status)?,
        reason: row.get(11)?,
        reply_id: row.get(12)?,
        received_at: parse_ts(13, &received_at)?,
        processed_at: parse_opt_ts(14, row.get(14)?)?,
        created_at: parse_ts(15, &created_at)?,
    })
}

/// Insert a mention. A second mention for the same (account, post) is a `Duplicate`.
pub async fn create_mention(db: &Database, mention: &Mention) -> Result<(), ThreadlyError> {
    let m = mention.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!(
                    "INSERT INTO mentions ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
                ),
                params![
                    m.id,
                    m.account_id,
                    m.post_id,
                    m.author.platform_user_id,
                    m.author.username,
                    m.author.display_name,
                    m.author.verified,
                    m.content,
                    to_json(&m.media_urls)?,
                    to_opt_json(&m.analysis)?,
                    m.status.to_string(),
                    m.reason,
                    m.reply_id,
                    fmt_ts(&m.received_at),
                    fmt_opt_ts(&m.processed_at),
                    fmt_ts(&m.created_at),
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(ThreadlyError::Duplicate {
            entity: "mention",
            key: format!("{}/{}", mention.account_id, mention.post_id),
        })
    }
}

pub async fn get_mention(db: &Database, id: &str) -> Result<Option<Mention>, ThreadlyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM mentions WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_mention) {
                Ok(m) => Ok(Some(m)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_mention_by_post_id(
    db: &Database,
    account_id: &str,
    post_id: &str,
) -> Result<Option<Mention>, ThreadlyError> {
    let account_id = account_id.to_string();
    let post_id = post_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM mentions WHERE account_id = ?1 AND post_id = ?2"
            ))?;
            match stmt.query_row(params![account_id, post_id], row_to_mention) {
                Ok(m) => Ok(Some(m)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List an account's mentions, newest first, optionally filtered by status.
pub async fn list_mentions(
    db: &Database,
    account_id: &str,
    limit: u32,
    offset: u32,
    status: Option<MentionStatus>,
) -> Result<Vec<Mention>, ThreadlyError> {
    let account_id = account_id.to_string();
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM mentions \
                 WHERE account_id = ?1 AND (?2 IS NULL OR status = ?2) \
                 ORDER BY received_at DESC, created_at DESC \
                 LIMIT ?3 OFFSET ?4"
            ))?;
            let rows = stmt.query_map(params![account_id, status, limit, offset], row_to_mention)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Persist every mutable field of a mention. Fails with `NotFound` when no row matches.
pub async fn update_mention(db: &Database, mention: &Mention) -> Result<(), ThreadlyError> {
    let m = mention.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE mentions SET author_username = ?1, author_display_name = ?2, \
                 author_verified = ?3, content = ?4, media_urls = ?5, analysis = ?6, status = ?7, \
                 reason = ?8, reply_id = ?9, processed_at = ?10 \
                 WHERE id = ?11",
                params![
                    m.author.username,
                    m.author.display_name,
                    m.author.verified,
                    m.content,
                    to_json(&m.media_urls)?,
                    to_opt_json(&m.analysis)?,
                    m.status.to_string(),
                    m.reason,
                    m.reply_id,
                    fmt_opt_ts(&m.processed_at),
                    m.id,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ThreadlyError::NotFound {
            entity: "mention",
            id: mention.id.clone(),
        });
    }
    Ok(())
}

/// Count replied mentions for an account processed at or after `since`.
pub async fn count_replied_since(
    db: &Database,
    account_id: &str,
    since: DateTime<Utc>,
) -> Result<u64, ThreadlyError> {
    let account_id = account_id.to_string();
    let since = fmt_ts(&since);
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM mentions \
                 WHERE account_id = ?1 AND status = ?2 AND processed_at >= ?3",
                params![account_id, MentionStatus::Replied.to_string(), since],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}
