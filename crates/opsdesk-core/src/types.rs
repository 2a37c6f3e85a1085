// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Opsdesk workspace.
//!
//! The entity structs here are the canonical shapes shared by the storage
//! crate (which maps them to rows) and the engine crate (which drives the
//! flows). Timestamps are ISO-8601 strings in UTC, matching what SQLite's
//! `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Numeric identity of a gateway user (client or operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Numeric identity of a gateway chat (a DM or the operator workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Numeric identity of a thread (forum topic) inside the operator workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub i64);

/// Ticket lifecycle states. `Completed` and `Cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl TicketStatus {
    /// Terminal states accept no further operator transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// Active states count against the one-active-ticket-per-user routing rule.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// The legal transition table.
    ///
    /// `Completed -> New` is the client reopen inside the grace window;
    /// `Completed -> InProgress` is the operator/system reopen that keeps
    /// assignment continuity. `Cancelled` accepts nothing.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (New, InProgress)
                | (InProgress, OnHold)
                | (OnHold, InProgress)
                | (New | InProgress | OnHold, Completed)
                | (New | InProgress | OnHold, Cancelled)
                | (Completed, New)
                | (Completed, InProgress)
        )
    }
}

/// Ticket priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    Urgent,
}

/// Who authored a ticket message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Client,
    Operator,
    System,
}

/// Payload kind of a ticket message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Photo,
    Video,
    Document,
    Voice,
    Audio,
}

impl MessageKind {
    /// `true` for kinds that carry an attachment handle rather than text.
    pub fn is_attachment(self) -> bool {
        !matches!(self, MessageKind::Text)
    }
}

/// CSAT signal submitted by the client after closure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Csat {
    Positive,
    Negative,
}

/// Dimension of the optional detailed CSAT rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RatingDimension {
    Speed,
    Quality,
    Politeness,
}

/// Blocking level chosen in the urgent sub-flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Blocker,
    Partial,
    Minor,
}

/// A file attached during ticket creation or appended to an active ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: MessageKind,
    /// Opaque gateway file handle, relayed by reference.
    pub file_handle: String,
    /// Gateway message id the attachment arrived in.
    pub message_id: i64,
}

// --- Persistent entities ---

/// A company. Owns exactly one lazily-created support thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub thread_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub created_at: String,
}

/// A project within a client, optionally joinable via invite code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub invite_code: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

/// A (user, project) membership. The binding with the most recent
/// `updated_at` is the user's current project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBinding {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub project_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// The unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: i64,
    /// Monotonically increasing, unique, gap-free under correct allocation.
    pub number: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub category: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub channel_id: i64,
    pub thread_id: Option<i64>,
    pub assigned_operator_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub first_response_at: Option<String>,
    pub closed_at: Option<String>,
}

/// Append-only log entry attached to a ticket. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub direction: MessageDirection,
    pub gateway_message_id: i64,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub file_handle: Option<String>,
    pub author_user_id: i64,
    pub created_at: String,
}

/// At most one CSAT record per ticket, enriched in place by the
/// detailed-rating sub-flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: i64,
    pub ticket_id: i64,
    pub csat: Csat,
    pub speed_rating: Option<i64>,
    pub quality_rating: Option<i64>,
    pub politeness_rating: Option<i64>,
    pub comment: Option<String>,
    pub created_at: String,
}

/// Parameters for creating a ticket. The thread is resolved by the routing
/// layer after creation, so `thread_id` starts out empty.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub project_id: i64,
    pub user_id: i64,
    pub category: String,
    pub description: String,
    pub priority: Priority,
    pub channel_id: i64,
}
