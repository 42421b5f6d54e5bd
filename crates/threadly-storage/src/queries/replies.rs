// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply CRUD operations.

use rusqlite::{Row, params};
use threadly_core::{Reply, ThreadlyError};

use super::{fmt_opt_ts, fmt_ts, from_opt_json, parse_enum, parse_opt_ts, parse_ts, to_opt_json};
use crate::database::{Database, is_unique_violation, map_tr_err};

const COLUMNS: &str = "id, account_id, mention_id, template_id, content, status, \
     threads_reply_id, provider_response, error, sent_at, created_at";

fn row_to_reply(row: &Row<'_>) -> rusqlite::Result<Reply> {
    let status: String = row.get(5)?;
    let created_at: String = row.get(10)?;
    Ok(Reply {
        id: row.get(0)?,
        account_id: row.get(1)?,
        mention_id: row.get(2)?,
        template_id: row.get(3)?,
        content: row.get(4)?,
        status: parse_enum(5, &status)?,
        threads_reply_id: row.get(6)?,
        provider_response: from_opt_json(7, row.get(7)?)?,
        error: row.get(8)?,
        sent_at: parse_opt_ts(9, row.get(9)?)?,
        created_at: parse_ts(10, &created_at)?,
    })
}

/// Insert a reply. A second reply for the same mention is a `Duplicate`.
pub async fn create_reply(db: &Database, reply: &Reply) -> Result<(), ThreadlyError> {
    let r = reply.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!(
                    "INSERT INTO replies ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    r.id,
                    r.account_id,
                    r.mention_id,
                    r.template_id,
                    r.content,
                    r.status.to_string(),
                    r.threads_reply_id,
                    to_opt_json(&r.provider_response)?,
                    r.error,
                    fmt_opt_ts(&r.sent_at),
                    fmt_ts(&r.created_at),
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
            entity: "reply",
            key: reply.mention_id.clone(),
        })
    }
}

pub async fn get_reply(db: &Database, id: &str) -> Result<Option<Reply>, ThreadlyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM replies WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_reply) {
                Ok(r) => Ok(Some(r)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_reply_by_mention(
    db: &Database,
    mention_id: &str,
) -> Result<Option<Reply>, ThreadlyError> {
    let mention_id = mention_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM replies WHERE mention_id = ?1"))?;
            match stmt.query_row(params![mention_id], row_to_reply) {
                Ok(r) => Ok(Some(r)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List an account's replies, newest first.
pub async fn list_replies(
    db: &Database,
    account_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<Reply>, ThreadlyError> {
    let account_id = account_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM replies WHERE account_id = ?1 \
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![account_id, limit, offset], row_to_reply)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_reply(db: &Database, reply: &Reply) -> Result<(), ThreadlyError> {
    let r = reply.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE replies SET template_id = ?1, content = ?2, status = ?3, \
                 threads_reply_id = ?4, provider_response = ?5, error = ?6, sent_at = ?7 \
                 WHERE id = ?8",
                params![
                    r.template_id,
                    r.content,
                    r.status.to_string(),
                    r.threads_reply_id,
                    to_opt_json(&r.provider_response)?,
                    r.error,
                    fmt_opt_ts(&r.sent_at),
                    r.id,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ThreadlyError::NotFound {
            entity: "reply",
            id: reply.id.clone(),
        });
    }
    Ok(())
}
