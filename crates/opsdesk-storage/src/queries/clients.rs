// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client CRUD operations.

use opsdesk_core::SupportError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Client;

fn client_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        thread_id: row.get(2)?,
        channel_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const COLS: &str = "id, name, thread_id, channel_id, created_at";

/// Create a new client.
pub async fn create(db: &Database, name: &str) -> Result<Client, SupportError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("INSERT INTO clients (name) VALUES (?1)", params![name])?;
            let id = conn.last_insert_rowid();
            let client = conn.query_row(
                &format!("SELECT {COLS} FROM clients WHERE id = ?1"),
                params![id],
                client_from_row,
            )?;
            Ok(client)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a client by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Client>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLS} FROM clients WHERE id = ?1"),
                params![id],
                client_from_row,
            );
            match result {
                Ok(client) => Ok(Some(client)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Bind a freshly created thread to the client, but only if it still has
/// none. Compare-and-set: concurrent resolvers race on the WHERE clause
/// and exactly one write wins. Returns `true` when this call's thread was
/// stored.
pub async fn set_thread_if_absent(
    db: &Database,
    client_id: i64,
    thread_id: i64,
    channel_id: i64,
) -> Result<bool, SupportError> {
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE clients SET thread_id = ?1, channel_id = ?2
                 WHERE id = ?3 AND thread_id IS NULL",
                params![thread_id, channel_id, client_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(map_tr_err)
}
