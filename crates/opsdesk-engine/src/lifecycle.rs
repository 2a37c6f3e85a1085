// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle manager.
//!
//! Enforces the status machine and claim semantics over the storage layer.
//! No gateway dependency: notifications are the caller's job, so a failed
//! send never leaves the store and the machine disagreeing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use opsdesk_core::SupportError;
use opsdesk_core::types::{NewTicket, Ticket, TicketStatus};
use opsdesk_storage::Database;
use opsdesk_storage::queries::tickets::{self, ClaimOutcome};
use tracing::info;

/// Hours after closure during which a client may reopen instead of filing
/// a new ticket.
pub const GRACE_HOURS: i64 = 48;

/// Enforces legal transitions and single-assignment semantics.
pub struct TicketLifecycle {
    db: Arc<Database>,
}

impl TicketLifecycle {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a ticket (number allocation and first message are atomic in
    /// the storage layer).
    pub async fn create(&self, new: NewTicket) -> Result<Ticket, SupportError> {
        if new.description.trim().is_empty() {
            return Err(SupportError::ValidationFailed(
                "ticket description must not be empty".into(),
            ));
        }
        let ticket = tickets::create(&self.db, new).await?;
        info!(
            number = ticket.number,
            user_id = ticket.user_id,
            category = %ticket.category,
            "ticket created"
        );
        Ok(ticket)
    }

    /// Claim a `new` ticket for an operator. Exactly one concurrent
    /// claimer wins; losers get [`SupportError::AlreadyTaken`]. Re-claim
    /// by the current assignee is idempotent.
    pub async fn claim(&self, ticket_id: i64, operator_id: i64) -> Result<Ticket, SupportError> {
        match tickets::claim(&self.db, ticket_id, operator_id).await? {
            ClaimOutcome::Claimed(ticket) => {
                info!(number = ticket.number, operator_id, "ticket claimed");
                Ok(ticket)
            }
            ClaimOutcome::AlreadyTaken(ticket) => Err(SupportError::AlreadyTaken {
                number: ticket.number,
            }),
            ClaimOutcome::NotFound => Err(SupportError::NotFound {
                entity: "ticket",
                id: ticket_id,
            }),
        }
    }

    /// `in_progress -> on_hold`. The reason is carried by the caller's
    /// notification, not the store.
    pub async fn pause(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        self.transition(ticket_id, TicketStatus::OnHold).await
    }

    /// `on_hold -> in_progress`.
    pub async fn resume(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        self.transition(ticket_id, TicketStatus::InProgress).await
    }

    /// Any active state `-> completed`.
    pub async fn close(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        self.transition(ticket_id, TicketStatus::Completed).await
    }

    /// Any active state `-> cancelled`. Requires a reason.
    pub async fn cancel(&self, ticket_id: i64, reason: &str) -> Result<Ticket, SupportError> {
        if reason.trim().is_empty() {
            return Err(SupportError::ValidationFailed(
                "cancellation requires a reason".into(),
            ));
        }
        self.transition(ticket_id, TicketStatus::Cancelled).await
    }

    /// Client reopen: only from `completed`, only inside the grace window.
    /// Resets to `new`, clearing `closed_at` and the assignment.
    pub async fn reopen_by_client(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        let ticket = self.require(ticket_id).await?;
        if ticket.status != TicketStatus::Completed || !self.within_grace(&ticket) {
            return Err(SupportError::IllegalTransition {
                from: ticket.status,
                to: TicketStatus::New,
            });
        }
        self.apply(ticket, TicketStatus::New).await
    }

    /// Operator/system reopen from the "recently closed" offer: back to
    /// `in_progress`, preserving continuity with the previous assignee.
    pub async fn reopen_by_operator(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        let ticket = self.require(ticket_id).await?;
        if ticket.status != TicketStatus::Completed {
            return Err(SupportError::IllegalTransition {
                from: ticket.status,
                to: TicketStatus::InProgress,
            });
        }
        self.apply(ticket, TicketStatus::InProgress).await
    }

    /// Client self-cancel: only while the ticket is still unclaimed.
    pub async fn client_self_cancel(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        let ticket = self.require(ticket_id).await?;
        if ticket.status != TicketStatus::New {
            return Err(SupportError::AlreadyTaken {
                number: ticket.number,
            });
        }
        self.apply(ticket, TicketStatus::Cancelled).await
    }

    /// Is the ticket's closure still inside the reopen grace window?
    pub fn within_grace(&self, ticket: &Ticket) -> bool {
        let Some(closed_at) = ticket.closed_at.as_deref() else {
            return false;
        };
        let Ok(closed_at) = DateTime::parse_from_rfc3339(closed_at) else {
            return false;
        };
        Utc::now() - closed_at.with_timezone(&Utc) <= Duration::hours(GRACE_HOURS)
    }

    /// ISO-8601 cutoff for "recently closed" queries.
    pub fn grace_cutoff(&self) -> String {
        (Utc::now() - Duration::hours(GRACE_HOURS))
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string()
    }

    async fn require(&self, ticket_id: i64) -> Result<Ticket, SupportError> {
        tickets::get(&self.db, ticket_id)
            .await?
            .ok_or(SupportError::NotFound {
                entity: "ticket",
                id: ticket_id,
            })
    }

    async fn transition(&self, ticket_id: i64, to: TicketStatus) -> Result<Ticket, SupportError> {
        let ticket = self.require(ticket_id).await?;
        self.apply(ticket, to).await
    }

    async fn apply(&self, ticket: Ticket, to: TicketStatus) -> Result<Ticket, SupportError> {
        if !ticket.status.can_transition_to(to) {
            return Err(SupportError::IllegalTransition {
                from: ticket.status,
                to,
            });
        }
        let updated = tickets::set_status(&self.db, ticket.id, to)
            .await?
            .ok_or(SupportError::NotFound {
                entity: "ticket",
                id: ticket.id,
            })?;
        info!(number = updated.number, from = %ticket.status, to = %to, "ticket transition");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::types::Priority;
    use opsdesk_storage::queries::{clients, projects};
    use rusqlite::params;
    use tempfile::tempdir;

    async fn setup() -> (Arc<Database>, TicketLifecycle, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Arc::new(Database::open(path.to_str().unwrap(), true).await.unwrap());
        let client = clients::create(&db, "Acme").await.unwrap();
        let project = projects::create(&db, client.id, "Support", None).await.unwrap();
        let lifecycle = TicketLifecycle::new(db.clone());
        (db, lifecycle, project.id, dir)
    }

    fn new_ticket(project_id: i64) -> NewTicket {
        NewTicket {
            project_id,
            user_id: 42,
            category: "billing".to_string(),
            description: "broken invoice".to_string(),
            priority: Priority::Normal,
            channel_id: -100,
        }
    }

    async fn backdate_closure(db: &Database, ticket_id: i64, hours_ago: i64) {
        let stamp = (Utc::now() - Duration::hours(hours_ago))
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE tickets SET closed_at = ?1 WHERE id = ?2",
                    params![stamp, ticket_id],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_rejects_blank_description() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let mut ticket = new_ticket(project_id);
        ticket.description = "   ".to_string();
        assert!(matches!(
            lifecycle.create(ticket).await,
            Err(SupportError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn claim_then_close_then_reopen_round_trip() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();

        let claimed = lifecycle.claim(ticket.id, 7).await.unwrap();
        assert_eq!(claimed.status, TicketStatus::InProgress);
        assert_eq!(claimed.assigned_operator_id, Some(7));

        let closed = lifecycle.close(ticket.id).await.unwrap();
        assert_eq!(closed.status, TicketStatus::Completed);
        assert!(closed.closed_at.is_some());

        // Inside the grace window: back to new, closure and assignment gone.
        let reopened = lifecycle.reopen_by_client(ticket.id).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::New);
        assert!(reopened.closed_at.is_none());
        assert!(reopened.assigned_operator_id.is_none());
    }

    #[tokio::test]
    async fn reopen_after_grace_window_is_rejected() {
        let (db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();
        lifecycle.claim(ticket.id, 7).await.unwrap();
        lifecycle.close(ticket.id).await.unwrap();
        backdate_closure(&db, ticket.id, GRACE_HOURS + 1).await;

        assert!(matches!(
            lifecycle.reopen_by_client(ticket.id).await,
            Err(SupportError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn operator_reopen_preserves_assignment() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();
        lifecycle.claim(ticket.id, 7).await.unwrap();
        lifecycle.close(ticket.id).await.unwrap();

        let reopened = lifecycle.reopen_by_operator(ticket.id).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::InProgress);
        assert_eq!(reopened.assigned_operator_id, Some(7));
    }

    #[tokio::test]
    async fn cancelled_is_not_reopenable() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();
        lifecycle.claim(ticket.id, 7).await.unwrap();
        lifecycle.cancel(ticket.id, "duplicate").await.unwrap();

        assert!(lifecycle.reopen_by_client(ticket.id).await.is_err());
        assert!(lifecycle.reopen_by_operator(ticket.id).await.is_err());
    }

    #[tokio::test]
    async fn pause_resume_cycle() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();

        // Pausing an unclaimed ticket is illegal.
        assert!(matches!(
            lifecycle.pause(ticket.id).await,
            Err(SupportError::IllegalTransition { .. })
        ));

        lifecycle.claim(ticket.id, 7).await.unwrap();
        let paused = lifecycle.pause(ticket.id).await.unwrap();
        assert_eq!(paused.status, TicketStatus::OnHold);
        let resumed = lifecycle.resume(ticket.id).await.unwrap();
        assert_eq!(resumed.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn cancel_requires_reason() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();
        assert!(matches!(
            lifecycle.cancel(ticket.id, "  ").await,
            Err(SupportError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn self_cancel_only_while_new() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();

        lifecycle.claim(ticket.id, 7).await.unwrap();
        assert!(matches!(
            lifecycle.client_self_cancel(ticket.id).await,
            Err(SupportError::AlreadyTaken { number: 1 })
        ));

        let other = lifecycle.create(new_ticket(project_id)).await.unwrap();
        let cancelled = lifecycle.client_self_cancel(other.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
    }

    #[tokio::test]
    async fn missing_ticket_is_not_found() {
        let (_db, lifecycle, _project_id, _dir) = setup().await;
        assert!(matches!(
            lifecycle.close(404).await,
            Err(SupportError::NotFound { id: 404, .. })
        ));
        assert!(matches!(
            lifecycle.claim(404, 7).await,
            Err(SupportError::NotFound { id: 404, .. })
        ));
    }

    #[tokio::test]
    async fn terminal_states_reject_operator_actions() {
        let (_db, lifecycle, project_id, _dir) = setup().await;
        let ticket = lifecycle.create(new_ticket(project_id)).await.unwrap();
        lifecycle.claim(ticket.id, 7).await.unwrap();
        lifecycle.close(ticket.id).await.unwrap();

        assert!(lifecycle.pause(ticket.id).await.is_err());
        assert!(lifecycle.close(ticket.id).await.is_err());
        assert!(lifecycle.cancel(ticket.id, "r").await.is_err());
        // Claiming a completed ticket is AlreadyTaken, not a crash.
        assert!(matches!(
            lifecycle.claim(ticket.id, 8).await,
            Err(SupportError::AlreadyTaken { .. })
        ));
    }
}
