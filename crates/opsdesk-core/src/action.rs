// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed callback actions and their wire encoding.
//!
//! Every inline button carries one of these actions as its callback data.
//! The encoding is a compact `prefix:arg` string; `decode` returns `None`
//! for data this build does not understand (stale keyboards from older
//! deployments are ignored, not errors).

use std::str::FromStr;

use crate::types::{RatingDimension, UrgencyLevel};

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    // Triage.
    TriageEnterCode,
    TriageNoCode,
    TriageSkipContact,

    // Ticket creation.
    SelectCategory(String),
    Urgency(UrgencyLevel),
    SkipAttachments,
    ShowSummary,
    EditCategory,
    EditDescription,
    EditAttachments,
    CancelDraft,
    Submit,

    // Client menu. Arguments are ticket numbers.
    MyTickets,
    NewRequest,
    AddDetails(i64),
    ClientCancel(i64),
    ClientCancelConfirm(i64),
    ClientReopen(i64),
    ClientReopenConfirm(i64),
    Reopen(i64),
    NewTicket,
    SwitchProject(i64),

    // Operator card actions. Arguments are ticket ids.
    OpTake(i64),
    OpPause(i64),
    OpResume(i64),
    OpClose(i64),
    OpCancel(i64),
    OpDetails(i64),
    OpMyTickets,

    // CSAT. Arguments are ticket ids.
    CsatPositive(i64),
    CsatNegative(i64),
    CsatSkipDetailed(i64),
    CsatRate {
        dimension: RatingDimension,
        rating: u8,
        ticket_id: i64,
    },
}

impl CallbackAction {
    /// Encode to callback-data wire format.
    pub fn encode(&self) -> String {
        use CallbackAction::*;
        match self {
            TriageEnterCode => "triage:enter_code".into(),
            TriageNoCode => "triage:no_code".into(),
            TriageSkipContact => "triage:skip_contact".into(),
            SelectCategory(id) => format!("category:{id}"),
            Urgency(level) => format!("urgency:{level}"),
            SkipAttachments => "ticket:skip_attachments".into(),
            ShowSummary => "ticket:show_summary".into(),
            EditCategory => "ticket:edit_category".into(),
            EditDescription => "ticket:edit_description".into(),
            EditAttachments => "ticket:edit_attachments".into(),
            CancelDraft => "ticket:cancel".into(),
            Submit => "ticket:submit".into(),
            MyTickets => "menu:my_tickets".into(),
            NewRequest => "menu:new_request".into(),
            AddDetails(n) => format!("menu:add_details:{n}"),
            ClientCancel(n) => format!("client:cancel:{n}"),
            ClientCancelConfirm(n) => format!("client:cancel_confirm:{n}"),
            ClientReopen(n) => format!("client:reopen:{n}"),
            ClientReopenConfirm(n) => format!("client:reopen_confirm:{n}"),
            Reopen(n) => format!("ticket:reopen:{n}"),
            NewTicket => "ticket:new".into(),
            SwitchProject(id) => format!("project:switch:{id}"),
            OpTake(id) => format!("op:take:{id}"),
            OpPause(id) => format!("op:pause:{id}"),
            OpResume(id) => format!("op:resume:{id}"),
            OpClose(id) => format!("op:close:{id}"),
            OpCancel(id) => format!("op:cancel:{id}"),
            OpDetails(id) => format!("op:details:{id}"),
            OpMyTickets => "op:my_tickets".into(),
            CsatPositive(id) => format!("csat:positive:{id}"),
            CsatNegative(id) => format!("csat:negative:{id}"),
            CsatSkipDetailed(id) => format!("csat:skip_detailed:{id}"),
            CsatRate {
                dimension,
                rating,
                ticket_id,
            } => format!("csat_detail:{dimension}:{rating}:{ticket_id}"),
        }
    }

    /// Decode from callback-data wire format.
    pub fn decode(data: &str) -> Option<CallbackAction> {
        use CallbackAction::*;

        let parts: Vec<&str> = data.split(':').collect();
        let action = match parts.as_slice() {
            ["triage", "enter_code"] => TriageEnterCode,
            ["triage", "no_code"] => TriageNoCode,
            ["triage", "skip_contact"] => TriageSkipContact,
            ["category", id] if !id.is_empty() => SelectCategory((*id).to_string()),
            ["urgency", level] => Urgency(UrgencyLevel::from_str(level).ok()?),
            ["ticket", "skip_attachments"] => SkipAttachments,
            ["ticket", "show_summary"] => ShowSummary,
            ["ticket", "edit_category"] => EditCategory,
            ["ticket", "edit_description"] => EditDescription,
            ["ticket", "edit_attachments"] => EditAttachments,
            ["ticket", "cancel"] => CancelDraft,
            ["ticket", "submit"] => Submit,
            ["ticket", "new"] => NewTicket,
            ["ticket", "reopen", n] => Reopen(n.parse().ok()?),
            ["menu", "my_tickets"] => MyTickets,
            ["menu", "new_request"] => NewRequest,
            ["menu", "add_details", n] => AddDetails(n.parse().ok()?),
            ["client", "cancel", n] => ClientCancel(n.parse().ok()?),
            ["client", "cancel_confirm", n] => ClientCancelConfirm(n.parse().ok()?),
            ["client", "reopen", n] => ClientReopen(n.parse().ok()?),
            ["client", "reopen_confirm", n] => ClientReopenConfirm(n.parse().ok()?),
            ["project", "switch", id] => SwitchProject(id.parse().ok()?),
            ["op", "take", id] => OpTake(id.parse().ok()?),
            ["op", "pause", id] => OpPause(id.parse().ok()?),
            ["op", "resume", id] => OpResume(id.parse().ok()?),
            ["op", "close", id] => OpClose(id.parse().ok()?),
            ["op", "cancel", id] => OpCancel(id.parse().ok()?),
            ["op", "details", id] => OpDetails(id.parse().ok()?),
            ["op", "my_tickets"] => OpMyTickets,
            ["csat", "positive", id] => CsatPositive(id.parse().ok()?),
            ["csat", "negative", id] => CsatNegative(id.parse().ok()?),
            ["csat", "skip_detailed", id] => CsatSkipDetailed(id.parse().ok()?),
            ["csat_detail", dim, rating, id] => {
                let rating: u8 = rating.parse().ok()?;
                if !(1..=5).contains(&rating) {
                    return None;
                }
                CsatRate {
                    dimension: RatingDimension::from_str(dim).ok()?,
                    rating,
                    ticket_id: id.parse().ok()?,
                }
            }
            _ => return None,
        };
        Some(action)
    }

    /// `true` for actions only operators may trigger.
    pub fn is_operator_action(&self) -> bool {
        use CallbackAction::*;
        matches!(
            self,
            OpTake(_)
                | OpPause(_)
                | OpResume(_)
                | OpClose(_)
                | OpCancel(_)
                | OpDetails(_)
                | OpMyTickets
        )
    }
}
