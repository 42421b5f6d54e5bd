// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account operations.

use rusqlite::{Row, params};
use threadly_core::{Account, StoredCredential, ThreadlyError};

use super::{fmt_ts, from_json, parse_opt_ts, parse_ts, to_json};
use crate::database::{Database, is_unique_violation, map_tr_err};

const COLUMNS: &str = "id, platform_user_id, username, display_name, auto_reply_enabled, \
     settings, sealed_token, token_nonce, token_expires_at, created_at, updated_at";

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    let settings: String = row.get(5)?;
    let sealed_token: Option<String> = row.get(6)?;
    let nonce: Option<String> = row.get(7)?;
    let expires_at = parse_opt_ts(8, row.get(8)?)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    let credential = match (sealed_token, nonce, expires_at) {
        (Some(sealed_token), Some(nonce), Some(expires_at)) => Some(StoredCredential {
            sealed_token,
            nonce,
            expires_at,
        }),
        _ => None,
    };

    Ok(Account {
        id: row.get(0)?,
        platform_user_id: row.get(1)?,
        username: row.get(2)?,
        display_name: row.get(3)?,
        auto_reply_enabled: row.get(4)?,
        settings: from_json(5, &settings)?,
        credential,
        created_at: parse_ts(9, &created_at)?,
        updated_at: parse_ts(10, &updated_at)?,
    })
}

pub async fn create_account(db: &Database, account: &Account) -> Result<(), ThreadlyError> {
    let a = account.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let cred = a.credential.as_ref();
            let result = conn.execute(
                &format!(
                    "INSERT INTO accounts ({COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    a.id,
                    a.platform_user_id,
                    a.username,
                    a.display_name,
                    a.auto_reply_enabled,
                    to_json(&a.settings)?,
                    cred.map(|c| c.sealed_token.clone()),
                    cred.map(|c| c.nonce.clone()),
                    cred.map(|c| fmt_ts(&c.expires_at)),
                    fmt_ts(&a.created_at),
                    fmt_ts(&a.updated_at),
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
            entity: "account",
            key: account.platform_user_id.clone(),
        })
    }
}

async fn get_account_where(
    db: &Database,
    column: &'static str,
    value: &str,
) -> Result<Option<Account>, ThreadlyError> {
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM accounts WHERE {column} = ?1"))?;
            match stmt.query_row(params![value], row_to_account) {
                Ok(a) => Ok(Some(a)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_account(db: &Database, id: &str) -> Result<Option<Account>, ThreadlyError> {
    get_account_where(db, "id", id).await
}

pub async fn get_account_by_platform_user_id(
    db: &Database,
    platform_user_id: &str,
) -> Result<Option<Account>, ThreadlyError> {
    get_account_where(db, "platform_user_id", platform_user_id).await
}

pub async fn update_account(db: &Database, account: &Account) -> Result<(), ThreadlyError> {
    let a = account.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let cred = a.credential.as_ref();
            conn.execute(
                "UPDATE accounts SET username = ?1, display_name = ?2, auto_reply_enabled = ?3, \
                 settings = ?4, sealed_token = ?5, token_nonce = ?6, token_expires_at = ?7, \
                 updated_at = ?8 WHERE id = ?9",
                params![
                    a.username,
                    a.display_name,
                    a.auto_reply_enabled,
                    to_json(&a.settings)?,
                    cred.map(|c| c.sealed_token.clone()),
                    cred.map(|c| c.nonce.clone()),
                    cred.map(|c| fmt_ts(&c.expires_at)),
                    fmt_ts(&chrono::Utc::now()),
                    a.id,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ThreadlyError::NotFound {
            entity: "account",
            id: account.id.clone(),
        });
    }
    Ok(())
}
