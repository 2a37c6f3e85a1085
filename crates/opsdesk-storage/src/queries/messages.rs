// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket message history. Append-only: rows are never updated or deleted.

use opsdesk_core::SupportError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{NewMessage, TicketMessage};
use crate::queries::parse_enum;

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TicketMessage> {
    Ok(TicketMessage {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        direction: parse_enum(2, row.get::<_, String>(2)?)?,
        gateway_message_id: row.get(3)?,
        kind: parse_enum(4, row.get::<_, String>(4)?)?,
        content: row.get(5)?,
        file_handle: row.get(6)?,
        author_user_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const COLS: &str =
    "id, ticket_id, direction, gateway_message_id, kind, content, file_handle, \
     author_user_id, created_at";

/// Append a message to a ticket's history.
pub async fn append(db: &Database, msg: NewMessage) -> Result<TicketMessage, SupportError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages
                     (ticket_id, direction, gateway_message_id, kind, content,
                      file_handle, author_user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.ticket_id,
                    msg.direction.to_string(),
                    msg.gateway_message_id,
                    msg.kind.to_string(),
                    msg.content,
                    msg.file_handle,
                    msg.author_user_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let message = conn.query_row(
                &format!("SELECT {COLS} FROM messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )?;
            Ok(message)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a ticket's messages in insertion order.
pub async fn for_ticket(
    db: &Database,
    ticket_id: i64,
    limit: i64,
) -> Result<Vec<TicketMessage>, SupportError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLS} FROM messages WHERE ticket_id = ?1
                 ORDER BY id ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![ticket_id, limit], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
