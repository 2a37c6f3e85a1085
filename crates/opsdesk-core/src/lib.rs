// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Opsdesk support bot.
//!
//! This crate provides the domain types (tickets, bindings, feedback),
//! the error taxonomy, the static category catalog, the typed callback
//! action wire format, and the [`SupportGateway`] trait that the channel
//! adapter implements. Orchestration lives in `opsdesk-engine`.

pub mod action;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod keyboard;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use action::CallbackAction;
pub use error::SupportError;
pub use gateway::SupportGateway;
pub use keyboard::{Button, ButtonAction, Keyboard};
pub use types::{
    Attachment, ChatId, Csat, MessageDirection, MessageKind, Priority, RatingDimension,
    ThreadId, Ticket, TicketStatus, UserId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_error_covers_the_domain_taxonomy() {
        let _not_bound = SupportError::NotBound;
        let _not_found = SupportError::NotFound {
            entity: "ticket",
            id: 7,
        };
        let _taken = SupportError::AlreadyTaken { number: 7 };
        let _illegal = SupportError::IllegalTransition {
            from: TicketStatus::Completed,
            to: TicketStatus::OnHold,
        };
        let _thread = SupportError::ThreadUnavailable("topic creation failed".into());
        let _validation = SupportError::ValidationFailed("empty reason".into());
    }

    #[test]
    fn status_round_trips_through_wire_strings() {
        use std::str::FromStr;

        for status in [
            TicketStatus::New,
            TicketStatus::InProgress,
            TicketStatus::OnHold,
            TicketStatus::Completed,
            TicketStatus::Cancelled,
        ] {
            let s = status.to_string();
            assert_eq!(TicketStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(TicketStatus::InProgress.to_string(), "in_progress");
    }
}
