// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline keyboard constructors.
//!
//! Every keyboard is built from typed [`CallbackAction`]s; the channel
//! adapter turns them into native markup.

use opsdesk_core::action::CallbackAction;
use opsdesk_core::catalog::CATEGORIES;
use opsdesk_core::keyboard::{Button, Keyboard};
use opsdesk_core::types::{RatingDimension, Ticket, TicketStatus, UrgencyLevel};

/// Category menu, two per row.
pub fn categories() -> Keyboard {
    let mut kb = Keyboard::new();
    for pair in CATEGORIES.chunks(2) {
        let row = pair
            .iter()
            .map(|c| {
                Button::callback(
                    format!("{} {}", c.emoji, c.label),
                    CallbackAction::SelectCategory(c.id.to_string()),
                )
            })
            .collect();
        kb = kb.row(row);
    }
    kb
}

/// First-contact triage: enter a code, or continue without one.
pub fn triage() -> Keyboard {
    Keyboard::new()
        .single(Button::callback(
            "\u{1F511} I have a project code",
            CallbackAction::TriageEnterCode,
        ))
        .single(Button::callback(
            "\u{1F4AC} Continue without a code",
            CallbackAction::TriageNoCode,
        ))
}

pub fn skip_contact() -> Keyboard {
    Keyboard::new().single(Button::callback("Skip", CallbackAction::TriageSkipContact))
}

/// Blocking-level choices for the urgent sub-flow.
pub fn urgency() -> Keyboard {
    Keyboard::new()
        .single(Button::callback(
            "\u{1F6D1} Work is fully blocked",
            CallbackAction::Urgency(UrgencyLevel::Blocker),
        ))
        .single(Button::callback(
            "\u{26A0} Partially working",
            CallbackAction::Urgency(UrgencyLevel::Partial),
        ))
        .single(Button::callback(
            "\u{1F7E1} Annoying but not blocking",
            CallbackAction::Urgency(UrgencyLevel::Minor),
        ))
}

pub fn skip_attachments() -> Keyboard {
    Keyboard::new().single(Button::callback(
        "Skip attachments",
        CallbackAction::SkipAttachments,
    ))
}

/// Shown after each received attachment.
pub fn preview() -> Keyboard {
    Keyboard::new().single(Button::callback(
        "\u{1F441} Preview request",
        CallbackAction::ShowSummary,
    ))
}

pub fn summary() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::callback("\u{1F4C1} Category", CallbackAction::EditCategory),
            Button::callback("\u{1F4DD} Description", CallbackAction::EditDescription),
            Button::callback("\u{1F4CE} Files", CallbackAction::EditAttachments),
        ])
        .row(vec![
            Button::callback("\u{274C} Cancel", CallbackAction::CancelDraft),
            Button::callback("\u{2705} Submit", CallbackAction::Submit),
        ])
}

pub fn after_ticket_menu() -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback("\u{1F4CB} My requests", CallbackAction::MyTickets),
        Button::callback("\u{2795} New request", CallbackAction::NewRequest),
    ])
}

pub fn reopen_or_new(number: i64) -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback("\u{1F504} Reopen", CallbackAction::Reopen(number)),
        Button::callback("\u{2795} New request", CallbackAction::NewTicket),
    ])
}

pub fn client_cancel_confirm(number: i64) -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback(
            "\u{2705} Yes, cancel it",
            CallbackAction::ClientCancelConfirm(number),
        ),
        Button::callback("\u{274C} No, keep it", CallbackAction::MyTickets),
    ])
}

pub fn client_reopen_confirm(number: i64) -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback(
            "\u{2705} Yes, reopen",
            CallbackAction::ClientReopenConfirm(number),
        ),
        Button::callback("\u{2795} No, new request", CallbackAction::NewRequest),
    ])
}

pub fn csat(ticket_id: i64) -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback("\u{1F44D}", CallbackAction::CsatPositive(ticket_id)),
        Button::callback("\u{1F44E}", CallbackAction::CsatNegative(ticket_id)),
    ])
}

/// Five stars for one rating dimension.
pub fn csat_detail(ticket_id: i64, dimension: RatingDimension) -> Keyboard {
    let row = (1..=5u8)
        .map(|rating| {
            Button::callback(
                "\u{2B50}".repeat(rating as usize),
                CallbackAction::CsatRate {
                    dimension,
                    rating,
                    ticket_id,
                },
            )
        })
        .collect();
    Keyboard::new().row(row)
}

pub fn csat_skip(ticket_id: i64) -> Keyboard {
    Keyboard::new().single(Button::callback(
        "Skip detailed rating",
        CallbackAction::CsatSkipDetailed(ticket_id),
    ))
}

/// Action buttons for a ticket card, matching its current status.
pub fn ticket_actions(ticket: &Ticket) -> Keyboard {
    match ticket.status {
        TicketStatus::New => Keyboard::new().row(vec![
            Button::callback("\u{1F680} Take", CallbackAction::OpTake(ticket.id)),
            Button::callback("\u{2753} Ask details", CallbackAction::OpDetails(ticket.id)),
        ]),
        TicketStatus::InProgress => Keyboard::new()
            .row(vec![
                Button::callback("\u{23F8} Pause", CallbackAction::OpPause(ticket.id)),
                Button::callback("\u{2753} Ask details", CallbackAction::OpDetails(ticket.id)),
            ])
            .row(vec![
                Button::callback("\u{2705} Close", CallbackAction::OpClose(ticket.id)),
                Button::callback("\u{274C} Cancel", CallbackAction::OpCancel(ticket.id)),
            ]),
        TicketStatus::OnHold => Keyboard::new()
            .row(vec![
                Button::callback("\u{25B6} Resume", CallbackAction::OpResume(ticket.id)),
            ])
            .row(vec![
                Button::callback("\u{2705} Close", CallbackAction::OpClose(ticket.id)),
                Button::callback("\u{274C} Cancel", CallbackAction::OpCancel(ticket.id)),
            ]),
        TicketStatus::Completed | TicketStatus::Cancelled => Keyboard::new(),
    }
}
