// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client- and operator-facing message templates.
//!
//! One constant or function per message. HTML markup only where the
//! gateway renders it (bold ticket numbers, italics for quoted questions).

use opsdesk_core::catalog;
use opsdesk_core::types::Ticket;

// --- Onboarding / triage ---

pub const NO_CODE_PROMPT: &str =
    "Hi! I don't know your company yet. Do you have a project code?";

pub const ASK_CODE: &str = "Please enter your project code:";

pub const INVALID_CODE: &str =
    "That code doesn't match any active project. Check it and try again, \
     or continue without a code.";

pub const TRIAGE_ASK_COMPANY: &str = "What company are you writing from?";

pub const TRIAGE_ASK_CONTACT: &str =
    "Leave a contact (email or phone) so we can reach you, or skip this step.";

pub const TRIAGE_DONE: &str =
    "Thanks! We've recorded your request and will get back to you shortly.";

pub fn code_accepted(name: &str, project: &str) -> String {
    format!(
        "Welcome, {name}! You're connected to <b>{project}</b>.\n\
         Pick a category to create a request:"
    )
}

pub fn welcome_back(name: &str) -> String {
    format!("Welcome back, {name}! Pick a category to create a request:")
}

pub fn welcome_first_time(name: &str) -> String {
    format!(
        "Hi, {name}! I'll route your requests straight to our support team.\n\
         Pick a category to get started:"
    )
}

pub const CHOOSE_CATEGORY: &str = "Pick a category for your request:";

// --- Ticket creation ---

pub const ASK_DESCRIPTION: &str = "Describe the problem in one message:";

/// Category-specific description prompts; generic fallback otherwise.
pub fn ask_description(category_id: &str) -> &'static str {
    match category_id {
        "report" => "Which report is affected, and what looks wrong?",
        "rating" => "Which rating looks incorrect, and what did you expect?",
        "widget" => "Which widget or integration is involved, and what happens?",
        "access" => "Who needs access, and to what?",
        "howto" => "What are you trying to set up or achieve?",
        "billing" => "What document or payment is this about?",
        "feature" => "Describe the improvement you'd like to see:",
        _ => ASK_DESCRIPTION,
    }
}

pub const URGENT_ASK_BLOCKING: &str = "How blocking is the issue?";

pub const URGENT_ASK_DETAILS: &str = "What exactly isn't working?";

pub const ASK_ATTACHMENTS: &str =
    "Attach screenshots or files if you have any, or skip this step.";

pub const ATTACHMENT_RECEIVED: &str =
    "Got it. Add more files, or preview your request.";

pub const EDIT_CATEGORY_PROMPT: &str = "Pick a new category:";

pub const EDIT_DESCRIPTION_PROMPT: &str = "Send the new description:";

pub const EDIT_ATTACHMENTS_PROMPT: &str =
    "Previous attachments were cleared. Send new files, or skip.";

pub const DRAFT_CANCELLED: &str = "Request discarded. Nothing was sent.";

pub fn summary(category_id: &str, description: &str, attachments: usize) -> String {
    let att = if attachments > 0 {
        format!("{attachments} file(s)")
    } else {
        "none".to_string()
    };
    format!(
        "Please check your request:\n\n\
         \u{1F4C1} <b>Category:</b> {}\n\
         \u{1F4DD} <b>Description:</b> {description}\n\
         \u{1F4CE} <b>Attachments:</b> {att}",
        catalog::category_label(category_id)
    )
}

pub fn ticket_created(number: i64, category_id: &str, off_hours: bool) -> String {
    let mut text = format!("\u{2705} Request <b>#{number}</b> created.");
    match catalog::sla_time(category_id) {
        Some(sla) => text.push_str(&format!("\nExpected response time: {sla}.")),
        None if category_id == "feature" => {
            text.push_str("\nFeature requests have no SLA; we'll review and reply.");
        }
        None => text.push_str("\nWe'll get back to you with details."),
    }
    if off_hours {
        text.push_str("\nIt's outside working hours right now; we'll reply on the next working day.");
    }
    text
}

pub const AFTER_TICKET_MENU: &str = "What would you like to do next?";

pub const NOT_BOUND: &str =
    "You're not connected to a project yet. Send /start to get set up.";

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

// --- Idle routing ---

pub fn appended_to_ticket(number: i64) -> String {
    format!(
        "Added your message to request <b>#{number}</b>. \
         The team will see it in the same conversation."
    )
}

pub fn reopen_or_new(number: i64) -> String {
    format!(
        "Your recent request <b>#{number}</b> was closed less than 48 hours ago.\n\
         Reopen it, or create a new one?"
    )
}

// --- Client ticket menu ---

pub const MY_TICKETS_HEADER: &str = "\u{1F4CB} <b>Your requests</b>\n";

pub const MY_TICKETS_EMPTY: &str = "You have no requests yet.";

pub fn my_tickets_item(ticket: &Ticket) -> String {
    let status = status_label(ticket);
    let description = ticket.description.as_deref().unwrap_or("");
    let short: String = if description.chars().count() > 50 {
        let truncated: String = description.chars().take(47).collect();
        format!("{truncated}...")
    } else {
        description.to_string()
    };
    format!(
        "<b>#{}</b> | {} | {}\n{} {}\n",
        ticket.number,
        catalog::category_label(&ticket.category),
        short,
        status_emoji(ticket),
        status
    )
}

pub fn status_label(ticket: &Ticket) -> &'static str {
    use opsdesk_core::types::TicketStatus::*;
    match ticket.status {
        New => "New",
        InProgress => "In progress",
        OnHold => "On hold",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

fn status_emoji(ticket: &Ticket) -> &'static str {
    use opsdesk_core::types::TicketStatus::*;
    match ticket.status {
        New => "\u{1F195}",
        InProgress => "\u{1F504}",
        OnHold => "\u{23F8}",
        Completed => "\u{2705}",
        Cancelled => "\u{274C}",
    }
}

pub fn add_details_prompt(number: i64) -> String {
    format!("Send your message and I'll attach it to request <b>#{number}</b>.")
}

pub const TICKET_NOT_ACTIVE: &str = "That request is no longer active.";

pub fn client_cancel_confirm(number: i64) -> String {
    format!("Cancel request <b>#{number}</b>?")
}

pub fn client_cancel_success(number: i64) -> String {
    format!("Request <b>#{number}</b> cancelled.")
}

pub const CLIENT_CANCEL_NOT_ALLOWED: &str =
    "This request is already in progress and can't be cancelled. \
     Message the operator instead.";

pub fn reopen_confirm(number: i64) -> String {
    format!("Reopen request <b>#{number}</b>?")
}

pub fn reopen_success(number: i64) -> String {
    format!("Request <b>#{number}</b> reopened. The team has been notified.")
}

pub const REOPEN_TOO_OLD: &str =
    "That request was closed more than 48 hours ago and can't be reopened. \
     Please create a new one.";

// --- Status notifications to the client ---

pub fn ticket_in_progress(number: i64) -> String {
    format!("\u{1F504} An operator picked up request <b>#{number}</b> and is on it.")
}

pub fn ticket_paused(number: i64, reason: &str) -> String {
    format!(
        "\u{23F8} Request <b>#{number}</b> is on hold.\n\
         Reason: {reason}"
    )
}

pub fn ticket_resumed(number: i64) -> String {
    format!("\u{25B6} Work on request <b>#{number}</b> has resumed.")
}

pub fn ticket_closed(number: i64) -> String {
    format!("\u{2705} Request <b>#{number}</b> is resolved.")
}

pub fn ticket_cancelled(number: i64, reason: &str) -> String {
    format!(
        "\u{274C} Request <b>#{number}</b> was cancelled.\n\
         Reason: {reason}"
    )
}

pub fn operator_reply(text: &str) -> String {
    format!("\u{1F4AC} Support:\n{text}")
}

pub fn details_request(number: i64, question: &str) -> String {
    format!(
        "\u{1F4AC} We need a little more detail on request <b>#{number}</b>:\n\n\
         <i>{question}</i>"
    )
}

// --- CSAT ---

pub const CSAT_ASK: &str = "How did we do? Please rate the resolution:";

pub const CSAT_THANKS_POSITIVE: &str = "Thanks for the feedback! \u{1F64F}";

pub const CSAT_THANKS_NEGATIVE: &str =
    "Thanks, and sorry we fell short. We'll look into it.";

pub const CSAT_ASK_COMMENT: &str = "What went wrong? A short comment helps us improve:";

pub const CSAT_ASK_DETAILED: &str =
    "Mind rating a few details? (or skip below)";

pub const CSAT_ASK_SPEED: &str = "\u{26A1} How fast was the resolution?";

pub const CSAT_ASK_QUALITY: &str = "\u{2728} How good was the solution?";

pub const CSAT_ASK_POLITENESS: &str = "\u{1F4AC} How polite was the communication?";

pub const CSAT_DETAILED_THANKS: &str = "Thank you, that helps a lot! \u{1F64F}";

pub fn csat_summary(speed: i64, quality: i64, politeness: i64) -> String {
    let stars = |n: i64| "\u{2B50}".repeat(n.max(0) as usize);
    format!(
        "\u{1F4CA} Your rating:\n\n\
         \u{26A1} Speed: {}\n\
         \u{2728} Quality: {}\n\
         \u{1F4AC} Politeness: {}\n\n{}",
        stars(speed),
        stars(quality),
        stars(politeness),
        CSAT_DETAILED_THANKS
    )
}

// --- Operator side ---

pub fn operator_need_id(user_id: i64) -> String {
    format!(
        "You're not on the operator list. Ask an admin to add your id {user_id} \
         to telegram.operators."
    )
}

pub const TICKET_NOT_FOUND: &str = "Ticket not found.";

pub fn already_taken(number: i64) -> String {
    format!("Ticket #{number} is already in progress.")
}

pub fn taken_status(ticket: &Ticket, operator_name: &str) -> String {
    let mut lines = vec![
        format!("\u{2705} Ticket #{} taken", ticket.number),
        format!("\u{1F464} Operator: {operator_name}"),
        format!(
            "\u{1F4C1} Category: {}",
            catalog::category_label(&ticket.category)
        ),
    ];
    match catalog::sla_time(&ticket.category) {
        Some(sla) => lines.push(format!("\u{23F1} Time to resolve: {sla}")),
        None if ticket.category == "feature" => {
            lines.push("\u{1F4A1} Feature request -- no SLA".to_string());
        }
        None => lines.push("\u{1F4CB} Get back to the client with details".to_string()),
    }
    lines.join("\n")
}

pub fn ask_pause_reason(number: i64) -> String {
    format!(
        "\u{23F8} Why is ticket #{number} going on hold?\n\
         (your next message in this thread is sent to the client)"
    )
}

pub fn ask_cancel_reason(number: i64) -> String {
    format!(
        "\u{1F4DD} Why is ticket #{number} being cancelled?\n\
         (your next message in this thread is sent to the client)"
    )
}

pub fn ask_details_question(number: i64) -> String {
    format!(
        "\u{1F4DD} What do you want to ask the client about ticket #{number}?\n\
         (your next message in this thread is sent as the question)"
    )
}

pub fn paused_confirm(number: i64) -> String {
    format!("\u{23F8} Ticket #{number} is on hold. The client got the reason.")
}

pub const RESUMED_CONFIRM: &str = "\u{25B6} Work resumed.";

pub const CLOSED_CONFIRM: &str =
    "\u{2705} Ticket closed. The client received a satisfaction prompt.";

pub const CANCELLED_CONFIRM: &str = "\u{274C} Ticket cancelled. The client was notified.";

pub const DETAILS_SENT_CONFIRM: &str = "\u{2705} Question sent to the client.";

pub const OPERATOR_MY_TICKETS_HEADER: &str = "\u{1F4CB} <b>Your tickets</b>";

pub const OPERATOR_NO_TICKETS: &str = "Nothing assigned to you right now.";

pub const OPERATOR_UNASSIGNED_HEADER: &str = "\u{1F4E5} <b>Unassigned tickets</b>";

pub const OPERATOR_NO_UNASSIGNED: &str = "No unassigned tickets. \u{1F389}";

pub fn operator_ticket_item(ticket: &Ticket) -> String {
    format!(
        "<b>#{}</b> [{}] {} -- {}",
        ticket.number,
        status_label(ticket),
        catalog::category_label(&ticket.category),
        ticket.description.as_deref().unwrap_or("")
    )
}

pub fn feedback_note(number: i64, positive: bool, comment: Option<&str>) -> String {
    let emoji = if positive { "\u{1F44D}" } else { "\u{1F44E}" };
    let mut text = format!("\u{1F4CA} <b>Feedback on ticket #{number}:</b> {emoji}");
    if let Some(comment) = comment {
        text.push_str(&format!("\n\n\u{1F4AC} {comment}"));
    }
    text
}

pub fn reopened_note(number: i64) -> String {
    format!("\u{1F504} <b>Ticket #{number} reopened by the client.</b>")
}

pub fn self_cancelled_note(number: i64) -> String {
    format!("\u{274C} Client cancelled ticket #{number} themselves.")
}

pub fn forward_header(number: i64, sender: &str) -> String {
    format!(
        "\u{1F4E9} <b>New message on ticket #{number}</b>\n\
         \u{1F464} From: {sender}"
    )
}

// --- Help / misc commands ---

pub const HELP: &str = "I route your requests to the support team.\n\n\
    /start -- connect to a project and create a request\n\
    /project -- view or switch your project\n\
    /help -- this message\n\n\
    Just send a message any time: if you have an active request it's \
    attached there, otherwise I'll help you create one.";

pub fn myid(user_id: i64) -> String {
    format!("Your id: {user_id}")
}

pub fn project_single(name: &str) -> String {
    format!("You're working with project <b>{name}</b>.")
}

pub const PROJECT_LIST: &str = "Your projects (current one is marked):";

pub fn project_switched(name: &str) -> String {
    format!("Switched to project <b>{name}</b>.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::types::{Priority, Ticket, TicketStatus};

    fn ticket(status: TicketStatus, description: &str) -> Ticket {
        Ticket {
            id: 1,
            number: 7,
            project_id: 1,
            user_id: 42,
            category: "billing".into(),
            description: Some(description.into()),
            priority: Priority::Normal,
            status,
            channel_id: -100,
            thread_id: Some(5),
            assigned_operator_id: None,
            created_at: "2026-01-05T10:00:00.000Z".into(),
            updated_at: "2026-01-05T10:00:00.000Z".into(),
            first_response_at: None,
            closed_at: None,
        }
    }

    #[test]
    fn created_text_mentions_sla_and_off_hours() {
        let text = ticket_created(7, "billing", false);
        assert!(text.contains("#7"));
        assert!(text.contains("1-2 business days"));
        assert!(!text.contains("working day"));

        let off = ticket_created(7, "billing", true);
        assert!(off.contains("next working day"));

        let feature = ticket_created(8, "feature", false);
        assert!(feature.contains("no SLA"));
    }

    #[test]
    fn my_tickets_item_truncates_long_descriptions() {
        let long = "x".repeat(80);
        let item = my_tickets_item(&ticket(TicketStatus::New, &long));
        assert!(item.contains("..."));
        assert!(!item.contains(&long));

        let short = my_tickets_item(&ticket(TicketStatus::New, "short"));
        assert!(short.contains("short"));
        assert!(!short.contains("..."));
    }

    #[test]
    fn csat_summary_renders_stars() {
        let text = csat_summary(5, 3, 1);
        assert!(text.contains(&"\u{2B50}".repeat(5)));
        assert!(text.contains(CSAT_DETAILED_THANKS));
    }

    #[test]
    fn status_labels_cover_all_states() {
        for (status, label) in [
            (TicketStatus::New, "New"),
            (TicketStatus::InProgress, "In progress"),
            (TicketStatus::OnHold, "On hold"),
            (TicketStatus::Completed, "Completed"),
            (TicketStatus::Cancelled, "Cancelled"),
        ] {
            assert_eq!(status_label(&ticket(status, "d")), label);
        }
    }
}
