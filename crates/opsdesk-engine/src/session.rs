// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral per-user session state.
//!
//! Sessions are scoped to one user and not contended across users, so a
//! sharded map with closure-based read-modify-write is all the locking
//! needed. A sweeper drops sessions idle past a configured bound.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use opsdesk_core::types::{Attachment, UrgencyLevel};
use tracing::debug;

use crate::stage::Stage;

/// Fields accumulated across a multi-step flow.
///
/// These survive stage loss and are what `infer_stage` reconstructs from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFields {
    pub project_id: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub attachments: Vec<Attachment>,
    pub urgency_level: Option<UrgencyLevel>,
    pub company: Option<String>,

    // CSAT sub-flow.
    pub feedback_ticket_id: Option<i64>,
    pub speed_rating: Option<i64>,
    pub quality_rating: Option<i64>,
    pub politeness_rating: Option<i64>,

    // Operator reason capture.
    pub reason_target: Option<ReasonTarget>,
}

/// The ticket an operator reason-capture sub-flow is aimed at.
///
/// The reply is accepted only from `thread_id`, so a reason typed in one
/// client's thread can never land on another client's ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonTarget {
    pub kind: ReasonKind,
    pub ticket_id: i64,
    pub ticket_number: i64,
    pub client_chat_id: i64,
    pub thread_id: i64,
}

/// Which operator action the captured reason feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonKind {
    Pause,
    Cancel,
    Details,
}

/// One user's conversation state: an explicit stage plus accumulated fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub stage: Option<Stage>,
    pub fields: SessionFields,
}

struct Entry {
    session: Session,
    touched_at: Instant,
}

/// Keyed by user id. Created on first multi-step interaction, cleared on
/// flow completion/cancellation, expired after idling.
#[derive(Default)]
pub struct SessionStore {
    inner: DashMap<i64, Entry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's session, if any.
    pub fn get(&self, user_id: i64) -> Option<Session> {
        self.inner.get(&user_id).map(|e| e.session.clone())
    }

    /// Atomic read-modify-write; creates a default session if absent.
    /// Returns the post-update snapshot.
    pub fn update<F>(&self, user_id: i64, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut entry = self.inner.entry(user_id).or_insert_with(|| Entry {
            session: Session::default(),
            touched_at: Instant::now(),
        });
        f(&mut entry.session);
        entry.touched_at = Instant::now();
        entry.session.clone()
    }

    /// Drop a user's session entirely.
    pub fn clear(&self, user_id: i64) {
        self.inner.remove(&user_id);
    }

    /// Drop sessions idle longer than `max_idle`. Returns how many went.
    pub fn expire_idle(&self, max_idle: Duration) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.touched_at.elapsed() <= max_idle);
        let expired = before - self.inner.len();
        if expired > 0 {
            debug!(expired, "expired idle sessions");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_creates_and_mutates() {
        let store = SessionStore::new();
        assert!(store.get(42).is_none());

        let session = store.update(42, |s| {
            s.stage = Some(Stage::AwaitingDescription);
            s.fields.category = Some("billing".into());
        });
        assert_eq!(session.stage, Some(Stage::AwaitingDescription));

        let again = store.update(42, |s| {
            s.fields.description = Some("text".into());
        });
        // Previous fields survive later updates.
        assert_eq!(again.fields.category.as_deref(), Some("billing"));
        assert_eq!(again.fields.description.as_deref(), Some("text"));
    }

    #[test]
    fn sessions_are_per_user() {
        let store = SessionStore::new();
        store.update(1, |s| s.fields.category = Some("access".into()));
        store.update(2, |s| s.fields.category = Some("billing".into()));

        assert_eq!(store.get(1).unwrap().fields.category.as_deref(), Some("access"));
        assert_eq!(store.get(2).unwrap().fields.category.as_deref(), Some("billing"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_removes_everything_for_the_user() {
        let store = SessionStore::new();
        store.update(1, |s| s.stage = Some(Stage::ShowingSummary));
        store.clear(1);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn expire_idle_sweeps_old_sessions() {
        let store = SessionStore::new();
        store.update(1, |s| s.stage = Some(Stage::ShowingSummary));
        store.update(2, |s| s.stage = Some(Stage::AwaitingDescription));

        // Nothing is older than an hour.
        assert_eq!(store.expire_idle(Duration::from_secs(3600)), 0);
        // Everything is older than zero.
        assert_eq!(store.expire_idle(Duration::ZERO), 2);
        assert!(store.is_empty());
    }
}
