// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration engine for the Opsdesk support bot.
//!
//! Four collaborators drive the system:
//!
//! - [`conversation::ConversationFlow`] -- the client-facing state machine
//!   (triage, ticket creation, idle routing) with the CSAT sub-flow in
//!   [`feedback::FeedbackFlow`].
//! - [`lifecycle::TicketLifecycle`] -- the ticket status machine and claim
//!   semantics, storage only.
//! - [`routing::RoutingService`] -- per-client thread resolution and
//!   bidirectional message forwarding over the gateway.
//! - [`operator::OperatorFlow`] -- operator actions with reason-capture
//!   sub-flows.
//!
//! Sessions are ephemeral per-user state in [`session::SessionStore`];
//! [`stage::infer_stage`] reconstructs a lost stage from accumulated
//! fields.

pub mod conversation;
pub mod feedback;
pub mod hours;
pub mod keyboards;
pub mod lifecycle;
pub mod operator;
pub mod routing;
pub mod session;
pub mod stage;
pub mod texts;

pub use conversation::{ConversationFlow, UserProfile};
pub use hours::WorkingHours;
pub use lifecycle::TicketLifecycle;
pub use operator::OperatorFlow;
pub use routing::RoutingService;
pub use session::{Session, SessionFields, SessionStore};
pub use stage::{Stage, infer_stage};

#[cfg(test)]
pub(crate) mod testutil;
