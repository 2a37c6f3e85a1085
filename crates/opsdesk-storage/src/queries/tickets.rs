// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket operations, including the two concurrency-sensitive ones:
//! number allocation (`create`) and operator claim (`claim`).

use opsdesk_core::SupportError;
use opsdesk_core::types::TicketStatus;
use rusqlite::params;

use crate::database::{Database, NOW, map_tr_err};
use crate::models::{NewTicket, Ticket};
use crate::queries::parse_enum;

pub(crate) fn ticket_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        number: row.get(1)?,
        project_id: row.get(2)?,
        user_id: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        priority: parse_enum(6, row.get::<_, String>(6)?)?,
        status: parse_enum(7, row.get::<_, String>(7)?)?,
        channel_id: row.get(8)?,
        thread_id: row.get(9)?,
        assigned_operator_id: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        first_response_at: row.get(13)?,
        closed_at: row.get(14)?,
    })
}

pub(crate) const COLS: &str = "id, number, project_id, user_id, category, description, \
     priority, status, channel_id, thread_id, assigned_operator_id, \
     created_at, updated_at, first_response_at, closed_at";

/// Outcome of a claim attempt.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// This operator now owns the ticket (or already did; re-claim is
    /// idempotent).
    Claimed(Ticket),
    /// Someone else got there first, or the ticket is past claiming.
    AlreadyTaken(Ticket),
    /// No such ticket.
    NotFound,
}

/// Create a ticket and its first (description) message in one transaction.
///
/// The number is allocated by the INSERT itself via
/// `(SELECT COALESCE(MAX(number), 0) + 1 FROM tickets)` -- a single atomic
/// statement on the single writer thread, so concurrent creates can
/// neither duplicate nor skip numbers. Nothing here enforces
/// one-active-ticket-per-user; that stays a flow-level invariant (the
/// conversation orchestrator prefers an existing active ticket over
/// creating a new one).
pub async fn create(db: &Database, new: NewTicket) -> Result<Ticket, SupportError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO tickets
                     (number, project_id, user_id, category, description, priority,
                      status, channel_id)
                 VALUES
                     ((SELECT COALESCE(MAX(number), 0) + 1 FROM tickets),
                      ?1, ?2, ?3, ?4, ?5, 'new', ?6)",
                params![
                    new.project_id,
                    new.user_id,
                    new.category,
                    new.description,
                    new.priority.to_string(),
                    new.channel_id,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO messages
                     (ticket_id, direction, gateway_message_id, kind, content, author_user_id)
                 VALUES (?1, 'client', 0, 'text', ?2, ?3)",
                params![id, new.description, new.user_id],
            )?;
            let ticket = tx.query_row(
                &format!("SELECT {COLS} FROM tickets WHERE id = ?1"),
                params![id],
                ticket_from_row,
            )?;
            tx.commit()?;
            Ok(ticket)
        })
        .await
        .map_err(map_tr_err)
}

/// Claim a ticket for an operator.
///
/// Compare-and-set: the UPDATE only fires while the ticket is still `new`
/// (or already assigned to the same operator, making re-claim idempotent).
/// `first_response_at` is set exactly once via COALESCE. Concurrent
/// claimers race on the WHERE clause; exactly one wins.
pub async fn claim(
    db: &Database,
    ticket_id: i64,
    operator_id: i64,
) -> Result<ClaimOutcome, SupportError> {
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                &format!(
                    "UPDATE tickets SET
                         status = 'in_progress',
                         assigned_operator_id = ?1,
                         first_response_at = COALESCE(first_response_at, {NOW}),
                         updated_at = {NOW}
                     WHERE id = ?2
                       AND (status = 'new'
                            OR (status = 'in_progress' AND assigned_operator_id = ?1))"
                ),
                params![operator_id, ticket_id],
            )?;
            let result = conn.query_row(
                &format!("SELECT {COLS} FROM tickets WHERE id = ?1"),
                params![ticket_id],
                ticket_from_row,
            );
            let ticket = match result {
                Ok(ticket) => ticket,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Ok(ClaimOutcome::NotFound);
                }
                Err(e) => return Err(e.into()),
            };
            if rows > 0 {
                Ok(ClaimOutcome::Claimed(ticket))
            } else {
                Ok(ClaimOutcome::AlreadyTaken(ticket))
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Write a new status with its column side effects:
/// terminal states stamp `closed_at`, reopening to `new` clears
/// `closed_at` and the assignment, everything touches `updated_at`.
/// Legality of the transition is the lifecycle manager's job.
pub async fn set_status(
    db: &Database,
    ticket_id: i64,
    status: TicketStatus,
) -> Result<Option<Ticket>, SupportError> {
    db.connection()
        .call(move |conn| {
            let sql = match status {
                TicketStatus::Completed | TicketStatus::Cancelled => format!(
                    "UPDATE tickets SET status = ?1, updated_at = {NOW}, closed_at = {NOW}
                     WHERE id = ?2"
                ),
                TicketStatus::New => format!(
                    "UPDATE tickets SET status = ?1, updated_at = {NOW},
                         closed_at = NULL, assigned_operator_id = NULL
                     WHERE id = ?2"
                ),
                TicketStatus::InProgress | TicketStatus::OnHold => format!(
                    "UPDATE tickets SET status = ?1, updated_at = {NOW} WHERE id = ?2"
                ),
            };
            let rows = conn.execute(&sql, params![status.to_string(), ticket_id])?;
            if rows == 0 {
                return Ok(None);
            }
            let ticket = conn.query_row(
                &format!("SELECT {COLS} FROM tickets WHERE id = ?1"),
                params![ticket_id],
                ticket_from_row,
            )?;
            Ok(Some(ticket))
        })
        .await
        .map_err(map_tr_err)
}

/// Record the thread a ticket's card lives in.
pub async fn set_thread(
    db: &Database,
    ticket_id: i64,
    thread_id: i64,
) -> Result<(), SupportError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tickets SET thread_id = ?1 WHERE id = ?2",
                params![thread_id, ticket_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

async fn get_one(db: &Database, sql: String, id: i64) -> Result<Option<Ticket>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(&sql, params![id], ticket_from_row);
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a ticket by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Ticket>, SupportError> {
    get_one(db, format!("SELECT {COLS} FROM tickets WHERE id = ?1"), id).await
}

/// Get a ticket by its client-facing number.
pub async fn get_by_number(db: &Database, number: i64) -> Result<Option<Ticket>, SupportError> {
    get_one(
        db,
        format!("SELECT {COLS} FROM tickets WHERE number = ?1"),
        number,
    )
    .await
}

/// Resolve the ticket a thread belongs to. Inbound operator messages are
/// routed through this; no match means the message is ignored.
pub async fn get_by_thread(
    db: &Database,
    thread_id: i64,
    channel_id: i64,
) -> Result<Option<Ticket>, SupportError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM tickets
                     WHERE thread_id = ?1 AND channel_id = ?2
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![thread_id, channel_id],
                ticket_from_row,
            );
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// The user's most recent non-terminal ticket, if any.
pub async fn active_for_user(
    db: &Database,
    user_id: i64,
) -> Result<Option<Ticket>, SupportError> {
    get_one(
        db,
        format!(
            "SELECT {COLS} FROM tickets
             WHERE user_id = ?1 AND status IN ('new', 'in_progress', 'on_hold')
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ),
        user_id,
    )
    .await
}

/// The user's most recently completed ticket closed at or after `cutoff`
/// (ISO-8601). Cancelled tickets are not reopenable and never returned.
pub async fn recent_completed_for_user(
    db: &Database,
    user_id: i64,
    cutoff: &str,
) -> Result<Option<Ticket>, SupportError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLS} FROM tickets
                     WHERE user_id = ?1 AND status = 'completed'
                       AND closed_at IS NOT NULL AND closed_at >= ?2
                     ORDER BY closed_at DESC, id DESC LIMIT 1"
                ),
                params![user_id, cutoff],
                ticket_from_row,
            );
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

async fn list(db: &Database, sql: String, id: i64, limit: i64) -> Result<Vec<Ticket>, SupportError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![id, limit], ticket_from_row)?;
            let mut tickets = Vec::new();
            for row in rows {
                tickets.push(row?);
            }
            Ok(tickets)
        })
        .await
        .map_err(map_tr_err)
}

/// The user's tickets, newest first.
pub async fn for_user(
    db: &Database,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Ticket>, SupportError> {
    list(
        db,
        format!(
            "SELECT {COLS} FROM tickets WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ),
        user_id,
        limit,
    )
    .await
}

/// Tickets currently worked by an operator (in progress or on hold).
pub async fn active_for_operator(
    db: &Database,
    operator_id: i64,
    limit: i64,
) -> Result<Vec<Ticket>, SupportError> {
    list(
        db,
        format!(
            "SELECT {COLS} FROM tickets
             WHERE assigned_operator_id = ?1 AND status IN ('in_progress', 'on_hold')
             ORDER BY updated_at DESC, id DESC LIMIT ?2"
        ),
        operator_id,
        limit,
    )
    .await
}

/// Unassigned new tickets, oldest first.
pub async fn unassigned(db: &Database, limit: i64) -> Result<Vec<Ticket>, SupportError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLS} FROM tickets
                 WHERE status = 'new' AND assigned_operator_id IS NULL
                 ORDER BY created_at ASC, id ASC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], ticket_from_row)?;
            let mut tickets = Vec::new();
            for row in rows {
                tickets.push(row?);
            }
            Ok(tickets)
        })
        .await
        .map_err(map_tr_err)
}

/// All allocated ticket numbers in ascending order.
pub async fn numbers(db: &Database) -> Result<Vec<i64>, SupportError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT number FROM tickets ORDER BY number ASC")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut numbers = Vec::new();
            for row in rows {
                numbers.push(row?);
            }
            Ok(numbers)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{clients, messages, projects};
    use opsdesk_core::types::Priority;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn setup() -> (Arc<Database>, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let client = clients::create(&db, "Acme").await.unwrap();
        let project = projects::create(&db, client.id, "Support", None).await.unwrap();
        (Arc::new(db), project.id, dir)
    }

    fn new_ticket(project_id: i64, user_id: i64, description: &str) -> NewTicket {
        NewTicket {
            project_id,
            user_id,
            category: "billing".to_string(),
            description: description.to_string(),
            priority: Priority::Normal,
            channel_id: -100,
        }
    }

    #[tokio::test]
    async fn create_persists_ticket_and_first_message() {
        let (db, project_id, _dir) = setup().await;

        let ticket = create(&db, new_ticket(project_id, 42, "Need invoice for March"))
            .await
            .unwrap();
        assert_eq!(ticket.number, 1);
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.priority, Priority::Normal);
        assert!(ticket.assigned_operator_id.is_none());
        assert!(ticket.closed_at.is_none());

        let history = messages::for_ticket(&db, ticket.id, 100).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content.as_deref(), Some("Need invoice for March"));
    }

    #[tokio::test]
    async fn concurrent_creates_allocate_contiguous_numbers() {
        let (db, project_id, _dir) = setup().await;

        let mut handles = Vec::new();
        for i in 0..16i64 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                create(&db, new_ticket(project_id, 1000 + i, "concurrent")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let allocated = numbers(&db).await.unwrap();
        assert_eq!(allocated, (1..=16).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "race me")).await.unwrap();

        let mut handles = Vec::new();
        for operator in 1..=8i64 {
            let db = db.clone();
            let id = ticket.id;
            handles.push(tokio::spawn(async move { claim(&db, id, operator).await }));
        }

        let mut winners = 0;
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                ClaimOutcome::Claimed(t) => {
                    winners += 1;
                    assert_eq!(t.status, TicketStatus::InProgress);
                    assert!(t.assigned_operator_id.is_some());
                    assert!(t.first_response_at.is_some());
                }
                ClaimOutcome::AlreadyTaken(_) => losers += 1,
                ClaimOutcome::NotFound => panic!("ticket exists"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(losers, 7);
    }

    #[tokio::test]
    async fn reclaim_by_same_operator_is_idempotent() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "mine")).await.unwrap();

        let first = claim(&db, ticket.id, 7).await.unwrap();
        assert!(matches!(first, ClaimOutcome::Claimed(_)));
        let ClaimOutcome::Claimed(t1) = first else { unreachable!() };

        let again = claim(&db, ticket.id, 7).await.unwrap();
        let ClaimOutcome::Claimed(t2) = again else {
            panic!("re-claim by owner should succeed")
        };
        assert_eq!(t2.assigned_operator_id, Some(7));
        // first_response_at is set once, not refreshed.
        assert_eq!(t1.first_response_at, t2.first_response_at);

        let other = claim(&db, ticket.id, 8).await.unwrap();
        assert!(matches!(other, ClaimOutcome::AlreadyTaken(_)));
    }

    #[tokio::test]
    async fn claim_missing_ticket_is_not_found() {
        let (db, _project_id, _dir) = setup().await;
        assert!(matches!(
            claim(&db, 404, 7).await.unwrap(),
            ClaimOutcome::NotFound
        ));
    }

    #[tokio::test]
    async fn set_status_column_side_effects() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "x")).await.unwrap();
        claim(&db, ticket.id, 7).await.unwrap();

        let completed = set_status(&db, ticket.id, TicketStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert!(completed.closed_at.is_some());

        // Reopen to new clears closure and assignment.
        let reopened = set_status(&db, ticket.id, TicketStatus::New)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.status, TicketStatus::New);
        assert!(reopened.closed_at.is_none());
        assert!(reopened.assigned_operator_id.is_none());

        assert!(set_status(&db, 404, TicketStatus::OnHold).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_and_recent_completed_lookups() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "x")).await.unwrap();

        assert_eq!(
            active_for_user(&db, 42).await.unwrap().unwrap().id,
            ticket.id
        );
        assert!(active_for_user(&db, 43).await.unwrap().is_none());

        set_status(&db, ticket.id, TicketStatus::Completed).await.unwrap();
        assert!(active_for_user(&db, 42).await.unwrap().is_none());

        // Epoch cutoff: everything qualifies.
        let recent = recent_completed_for_user(&db, 42, "1970-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(recent.unwrap().id, ticket.id);

        // Far-future cutoff: nothing qualifies.
        let none = recent_completed_for_user(&db, 42, "9999-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn cancelled_tickets_are_never_offered_for_reopen() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "x")).await.unwrap();
        set_status(&db, ticket.id, TicketStatus::Cancelled).await.unwrap();

        let recent = recent_completed_for_user(&db, 42, "1970-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert!(recent.is_none());
    }

    #[tokio::test]
    async fn thread_and_operator_lookups() {
        let (db, project_id, _dir) = setup().await;
        let ticket = create(&db, new_ticket(project_id, 42, "x")).await.unwrap();
        set_thread(&db, ticket.id, 555).await.unwrap();

        let by_thread = get_by_thread(&db, 555, -100).await.unwrap().unwrap();
        assert_eq!(by_thread.id, ticket.id);
        assert!(get_by_thread(&db, 555, -999).await.unwrap().is_none());

        assert_eq!(unassigned(&db, 20).await.unwrap().len(), 1);
        claim(&db, ticket.id, 7).await.unwrap();
        assert!(unassigned(&db, 20).await.unwrap().is_empty());
        assert_eq!(active_for_operator(&db, 7, 20).await.unwrap().len(), 1);
        assert!(active_for_operator(&db, 8, 20).await.unwrap().is_empty());
    }
}
