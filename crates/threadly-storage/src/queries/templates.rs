// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template read/insert operations. Editing is done by the operator outside
//! the pipeline.

use rusqlite::{Row, params};
use threadly_core::{MentionType, Template, ThreadlyError};

use super::{fmt_ts, from_json, from_opt_json, parse_enum, parse_ts, to_json, to_opt_json};
use crate::database::{Database, is_unique_violation, map_tr_err};

const COLUMNS: &str = "id, account_id, name, mention_type, content, variables, is_active, \
     priority, conditions, created_at, updated_at";

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<Template> {
    let mention_type: String = row.get(3)?;
    let variables: String = row.get(5)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    Ok(Template {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        mention_type: parse_enum(3, &mention_type)?,
        content: row.get(4)?,
        variables: from_json(5, &variables)?,
        is_active: row.get(6)?,
        priority: row.get(7)?,
        conditions: from_opt_json(8, row.get(8)?)?,
        created_at: parse_ts(9, &created_at)?,
        updated_at: parse_ts(10, &updated_at)?,
    })
}

pub async fn create_template(db: &Database, template: &Template) -> Result<(), ThreadlyError> {
    let t = template.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!(
                    "INSERT INTO templates ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    t.id,
                    t.account_id,
                    t.name,
                    t.mention_type.to_string(),
                    t.content,
                    to_json(&t.variables)?,
                    t.is_active,
                    t.priority,
                    to_opt_json(&t.conditions)?,
                    fmt_ts(&t.created_at),
                    fmt_ts(&t.updated_at),
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
            entity: "template",
            key: template.id.clone(),
        })
    }
}

pub async fn get_template(db: &Database, id: &str) -> Result<Option<Template>, ThreadlyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM templates WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_template) {
                Ok(t) => Ok(Some(t)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_templates(db: &Database, account_id: &str) -> Result<Vec<Template>, ThreadlyError> {
    let account_id = account_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM templates WHERE account_id = ?1 \
                 ORDER BY priority ASC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![account_id], row_to_template)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Active templates for one mention type, lowest priority value first, then newest.
pub async fn list_active_templates(
    db: &Database,
    account_id: &str,
    mention_type: MentionType,
) -> Result<Vec<Template>, ThreadlyError> {
    let account_id = account_id.to_string();
    let mention_type = mention_type.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM templates \
                 WHERE account_id = ?1 AND mention_type = ?2 AND is_active = 1 \
                 ORDER BY priority ASC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![account_id, mention_type], row_to_template)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
