// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical entity types are defined in `opsdesk-core::types` for use
//! across crate boundaries; this module re-exports them and adds the
//! storage-side input structs.

pub use opsdesk_core::types::{
    Client, Feedback, NewTicket, Project, Ticket, TicketMessage, UserBinding,
};

use opsdesk_core::types::{MessageDirection, MessageKind};

/// Parameters for appending a message to a ticket's history.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub ticket_id: i64,
    pub direction: MessageDirection,
    pub gateway_message_id: i64,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub file_handle: Option<String>,
    pub author_user_id: i64,
}
