// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSAT feedback. At most one row per ticket, enriched in place.

use opsdesk_core::SupportError;
use opsdesk_core::types::Csat;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Feedback;
use crate::queries::parse_enum;

fn feedback_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        csat: parse_enum(2, row.get::<_, String>(2)?)?,
        speed_rating: row.get(3)?,
        quality_rating: row.get(4)?,
        politeness_rating: row.get(5)?,
        comment: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const COLS: &str =
    "id, ticket_id, csat, speed_rating, quality_rating, politeness_rating, comment, created_at";

/// Record the CSAT signal for a ticket, once.
///
/// A second submission for the same ticket leaves the original untouched
/// (the UNIQUE constraint plus DO NOTHING makes resubmission harmless).
pub async fn create_if_absent(
    db: &Database,
    ticket_id: i64,
    csat: Csat,
    comment: Option<&str>,
) -> Result<Feedback, SupportError> {
    let comment = comment.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO feedback (ticket_id, csat, comment) VALUES (?1, ?2, ?3)
                 ON CONFLICT(ticket_id) DO NOTHING",
                params![ticket_id, csat.to_string(), comment],
            )?;
            let feedback = conn.query_row(
                &format!("SELECT {COLS} FROM feedback WHERE ticket_id = ?1"),
                params![ticket_id],
                feedback_from_row,
            )?;
            Ok(feedback)
        })
        .await
        .map_err(map_tr_err)
}

/// Get the feedback for a ticket.
pub async fn by_ticket(db: &Database, ticket_id: i64) -> Result<Option<Feedback>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLS} FROM feedback WHERE ticket_id = ?1"),
                params![ticket_id],
                feedback_from_row,
            );
            match result {
                Ok(feedback) => Ok(Some(feedback)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Attach the three detailed ratings to an existing feedback row.
pub async fn set_detailed_ratings(
    db: &Database,
    ticket_id: i64,
    speed: i64,
    quality: i64,
    politeness: i64,
) -> Result<Option<Feedback>, SupportError> {
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE feedback SET speed_rating = ?1, quality_rating = ?2,
                     politeness_rating = ?3
                 WHERE ticket_id = ?4",
                params![speed, quality, politeness, ticket_id],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let feedback = conn.query_row(
                &format!("SELECT {COLS} FROM feedback WHERE ticket_id = ?1"),
                params![ticket_id],
                feedback_from_row,
            )?;
            Ok(Some(feedback))
        })
        .await
        .map_err(map_tr_err)
}
