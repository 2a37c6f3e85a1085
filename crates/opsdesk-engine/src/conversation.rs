// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-facing conversation orchestrator.
//!
//! Drives triage, ticket creation (category, urgent sub-flow, description,
//! attachments, summary/edit loop, submit), and idle routing. The stage to
//! act on is the explicit session stage when present, else
//! [`infer_stage`]'s reconstruction from accumulated fields -- so a lost
//! stage resumes instead of restarting, and duplicate recovered input is
//! absorbed.

use std::sync::Arc;

use opsdesk_core::action::CallbackAction;
use opsdesk_core::catalog;
use opsdesk_core::keyboard::{Button, Keyboard};
use opsdesk_core::types::{
    Attachment, ChatId, MessageDirection, MessageKind, NewTicket, Priority, Ticket,
    UrgencyLevel,
};
use opsdesk_core::SupportError;
use opsdesk_storage::queries::{bindings, messages, projects, tickets};
use opsdesk_storage::{Database, NewMessage};
use tracing::{info, warn};

use crate::feedback::FeedbackFlow;
use crate::hours::WorkingHours;
use crate::keyboards;
use crate::lifecycle::TicketLifecycle;
use crate::routing::{InboundContent, RoutingService};
use crate::session::SessionStore;
use crate::stage::{Stage, infer_stage};
use crate::texts;

/// Identity of the user an inbound event came from.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl UserProfile {
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("there")
    }

    /// "Alice (@alice)" style label for thread headers and cards.
    pub fn sender_label(&self) -> String {
        match (&self.display_name, &self.username) {
            (Some(name), Some(username)) => format!("{name} (@{username})"),
            (Some(name), None) => name.clone(),
            (None, Some(username)) => format!("@{username}"),
            (None, None) => format!("id {}", self.user_id),
        }
    }
}

/// The client-side state machine.
pub struct ConversationFlow {
    db: Arc<Database>,
    sessions: Arc<SessionStore>,
    lifecycle: Arc<TicketLifecycle>,
    routing: Arc<RoutingService>,
    hours: WorkingHours,
    feedback: FeedbackFlow,
}

impl ConversationFlow {
    pub fn new(
        db: Arc<Database>,
        sessions: Arc<SessionStore>,
        lifecycle: Arc<TicketLifecycle>,
        routing: Arc<RoutingService>,
        hours: WorkingHours,
    ) -> Self {
        let feedback = FeedbackFlow::new(db.clone(), sessions.clone(), routing.clone());
        Self {
            db,
            sessions,
            lifecycle,
            routing,
            hours,
            feedback,
        }
    }

    async fn send(
        &self,
        user: &UserProfile,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), SupportError> {
        self.routing
            .gateway()
            .send_text(ChatId(user.chat_id), text, keyboard)
            .await?;
        Ok(())
    }

    /// `/start`, optionally with an invite code from a deep link.
    pub async fn on_start(
        &self,
        user: &UserProfile,
        deep_link: Option<&str>,
    ) -> Result<(), SupportError> {
        self.sessions.clear(user.user_id);

        if let Some(code) = deep_link.filter(|c| !c.trim().is_empty()) {
            self.try_bind_with_code(user, code).await?;
            return Ok(());
        }

        match bindings::current(&self.db, user.user_id).await? {
            Some(_) => {
                let has_tickets = !tickets::for_user(&self.db, user.user_id, 1)
                    .await?
                    .is_empty();
                let welcome = if has_tickets {
                    texts::welcome_back(user.greeting_name())
                } else {
                    texts::welcome_first_time(user.greeting_name())
                };
                self.send(user, &welcome, Some(keyboards::categories())).await
            }
            None => {
                info!(user_id = user.user_id, "unknown user started triage");
                self.send(user, texts::NO_CODE_PROMPT, Some(keyboards::triage()))
                    .await
            }
        }
    }

    /// A plain text message from the client.
    pub async fn on_text(
        &self,
        user: &UserProfile,
        message_id: i64,
        text: &str,
    ) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        let stage = session.stage.or_else(|| infer_stage(&session.fields));

        match stage {
            Some(Stage::TriageAwaitingCode) => {
                self.try_bind_with_code(user, text).await?;
                Ok(())
            }
            Some(Stage::TriageAwaitingCompany) => {
                let company = text.trim().to_string();
                self.sessions.update(user.user_id, |s| {
                    s.fields.company = Some(company);
                    s.stage = Some(Stage::TriageAwaitingContact);
                });
                self.send(
                    user,
                    texts::TRIAGE_ASK_CONTACT,
                    Some(keyboards::skip_contact()),
                )
                .await
            }
            Some(Stage::TriageAwaitingContact) => {
                self.finish_triage(user, Some(text.trim())).await
            }
            Some(Stage::AwaitingUrgencyDetails) => {
                let level = session
                    .fields
                    .urgency_level
                    .unwrap_or(UrgencyLevel::Blocker);
                let description = format!("[{level}] {}", text.trim());
                self.accept_description(user, description).await
            }
            Some(Stage::AwaitingDescription) => {
                let description = text.trim().to_string();
                if description.is_empty() {
                    return self.send(user, texts::ASK_DESCRIPTION, None).await;
                }
                self.accept_description(user, description).await
            }
            Some(Stage::EditingDescription) => {
                let description = text.trim().to_string();
                if description.is_empty() {
                    return self.send(user, texts::EDIT_DESCRIPTION_PROMPT, None).await;
                }
                self.sessions.update(user.user_id, |s| {
                    s.fields.description = Some(description);
                });
                self.show_summary(user).await
            }
            Some(Stage::AwaitingFeedbackComment) => self.feedback.on_comment(user, text).await,
            // Collecting/summary/editing stages wait for buttons or
            // attachments; a stray (possibly duplicate recovered) text
            // must not overwrite anything.
            Some(Stage::CollectingAttachments)
            | Some(Stage::ShowingSummary)
            | Some(Stage::EditingCategory)
            | Some(Stage::EditingAttachments)
            | Some(Stage::AwaitingUrgencyLevel) => Ok(()),
            Some(s) if s.is_feedback_stage() || s.is_operator_stage() => Ok(()),
            Some(_) | None => {
                self.idle_route(
                    user,
                    InboundContent {
                        kind: MessageKind::Text,
                        text: Some(text.to_string()),
                        file_handle: None,
                        message_id,
                    },
                )
                .await
            }
        }
    }

    /// An attachment (photo/video/document/voice/audio) from the client.
    pub async fn on_attachment(
        &self,
        user: &UserProfile,
        attachment: Attachment,
    ) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        let stage = session.stage.or_else(|| infer_stage(&session.fields));

        match stage {
            Some(Stage::CollectingAttachments) | Some(Stage::EditingAttachments) => {
                self.sessions.update(user.user_id, |s| {
                    s.fields.attachments.push(attachment);
                });
                self.send(user, texts::ATTACHMENT_RECEIVED, Some(keyboards::preview()))
                    .await
            }
            None => {
                let content = InboundContent {
                    kind: attachment.kind,
                    text: None,
                    file_handle: Some(attachment.file_handle),
                    message_id: attachment.message_id,
                };
                self.idle_route(user, content).await
            }
            // Mid-flow attachments outside the collecting stages are
            // ignored, matching the text no-op above.
            Some(_) => Ok(()),
        }
    }

    /// A decoded button press from the client.
    pub async fn on_callback(
        &self,
        user: &UserProfile,
        action: CallbackAction,
    ) -> Result<(), SupportError> {
        match action {
            CallbackAction::TriageEnterCode => {
                self.sessions.update(user.user_id, |s| {
                    s.stage = Some(Stage::TriageAwaitingCode);
                });
                self.send(user, texts::ASK_CODE, None).await
            }
            CallbackAction::TriageNoCode => {
                self.sessions.update(user.user_id, |s| {
                    s.stage = Some(Stage::TriageAwaitingCompany);
                });
                self.send(user, texts::TRIAGE_ASK_COMPANY, None).await
            }
            CallbackAction::TriageSkipContact => self.finish_triage(user, None).await,

            CallbackAction::SelectCategory(category_id) => {
                self.select_category(user, &category_id).await
            }
            CallbackAction::Urgency(level) => {
                let session = self.sessions.get(user.user_id).unwrap_or_default();
                if session.stage != Some(Stage::AwaitingUrgencyLevel) {
                    return Ok(());
                }
                self.sessions.update(user.user_id, |s| {
                    s.fields.urgency_level = Some(level);
                    s.stage = Some(Stage::AwaitingUrgencyDetails);
                });
                self.send(user, texts::URGENT_ASK_DETAILS, None).await
            }
            CallbackAction::SkipAttachments => {
                let session = self.sessions.get(user.user_id).unwrap_or_default();
                match session.stage.or_else(|| infer_stage(&session.fields)) {
                    Some(Stage::EditingAttachments) => {
                        self.sessions.update(user.user_id, |s| {
                            s.fields.attachments.clear();
                        });
                        self.show_summary(user).await
                    }
                    Some(Stage::CollectingAttachments) => self.show_summary(user).await,
                    // Stale skip from an already-passed stage: no-op.
                    _ => Ok(()),
                }
            }
            CallbackAction::ShowSummary => {
                let session = self.sessions.get(user.user_id).unwrap_or_default();
                match session.stage.or_else(|| infer_stage(&session.fields)) {
                    Some(Stage::CollectingAttachments) | Some(Stage::EditingAttachments) => {
                        self.show_summary(user).await
                    }
                    _ => Ok(()),
                }
            }
            CallbackAction::EditCategory => {
                self.require_summary_then(user, Stage::EditingCategory).await?;
                Ok(())
            }
            CallbackAction::EditDescription => {
                self.require_summary_then(user, Stage::EditingDescription).await?;
                Ok(())
            }
            CallbackAction::EditAttachments => {
                let session = self.sessions.get(user.user_id).unwrap_or_default();
                if session.stage != Some(Stage::ShowingSummary) {
                    return Ok(());
                }
                self.sessions.update(user.user_id, |s| {
                    s.fields.attachments.clear();
                    s.stage = Some(Stage::EditingAttachments);
                });
                self.send(
                    user,
                    texts::EDIT_ATTACHMENTS_PROMPT,
                    Some(keyboards::skip_attachments()),
                )
                .await
            }
            CallbackAction::CancelDraft => {
                self.sessions.clear(user.user_id);
                self.send(user, texts::DRAFT_CANCELLED, None).await
            }
            CallbackAction::Submit => self.submit(user).await,

            CallbackAction::Reopen(number) => self.reopen_from_offer(user, number).await,
            CallbackAction::NewTicket | CallbackAction::NewRequest => {
                if bindings::current(&self.db, user.user_id).await?.is_none() {
                    return self.send(user, texts::NOT_BOUND, None).await;
                }
                self.sessions.clear(user.user_id);
                self.send(user, texts::CHOOSE_CATEGORY, Some(keyboards::categories()))
                    .await
            }
            CallbackAction::MyTickets => self.my_tickets(user).await,
            CallbackAction::AddDetails(number) => {
                match tickets::get_by_number(&self.db, number).await? {
                    Some(ticket) if ticket.user_id == user.user_id && ticket.status.is_active() => {
                        self.send(user, &texts::add_details_prompt(number), None).await
                    }
                    _ => self.send(user, texts::TICKET_NOT_ACTIVE, None).await,
                }
            }
            CallbackAction::ClientCancel(number) => self.client_cancel_offer(user, number).await,
            CallbackAction::ClientCancelConfirm(number) => {
                self.client_cancel_confirm(user, number).await
            }
            CallbackAction::ClientReopen(number) => self.client_reopen_offer(user, number).await,
            CallbackAction::ClientReopenConfirm(number) => {
                self.client_reopen_confirm(user, number).await
            }
            CallbackAction::SwitchProject(project_id) => {
                match bindings::touch(&self.db, user.user_id, project_id).await? {
                    Some(_) => {
                        let name = projects::get(&self.db, project_id)
                            .await?
                            .map(|p| p.name)
                            .unwrap_or_else(|| "unknown".to_string());
                        self.send(user, &texts::project_switched(&name), None).await
                    }
                    None => self.send(user, texts::GENERIC_ERROR, None).await,
                }
            }

            CallbackAction::CsatPositive(_)
            | CallbackAction::CsatNegative(_)
            | CallbackAction::CsatSkipDetailed(_)
            | CallbackAction::CsatRate { .. } => self.feedback.on_callback(user, action).await,

            // Operator actions never reach the client flow.
            _ => Ok(()),
        }
    }

    /// `/help`
    pub async fn help(&self, user: &UserProfile) -> Result<(), SupportError> {
        self.send(user, texts::HELP, None).await
    }

    /// `/myid`
    pub async fn myid(&self, user: &UserProfile) -> Result<(), SupportError> {
        self.send(user, &texts::myid(user.user_id), None).await
    }

    /// `/project` -- show bindings, allow switching the current one.
    pub async fn project_menu(&self, user: &UserProfile) -> Result<(), SupportError> {
        let all = bindings::list_with_projects(&self.db, user.user_id).await?;
        match all.as_slice() {
            [] => self.send(user, texts::NOT_BOUND, None).await,
            [(_, project)] => {
                self.send(user, &texts::project_single(&project.name), None).await
            }
            _ => {
                let mut kb = Keyboard::new();
                for (i, (_, project)) in all.iter().enumerate() {
                    let prefix = if i == 0 { "\u{2713} " } else { "" };
                    kb = kb.single(Button::callback(
                        format!("{prefix}{}", project.name),
                        CallbackAction::SwitchProject(project.id),
                    ));
                }
                self.send(user, texts::PROJECT_LIST, Some(kb)).await
            }
        }
    }

    // --- internals ---

    /// Validate an invite code and bind on success. Either way the
    /// session is cleared; a bad code only yields the triage keyboard
    /// again -- nothing persists past the triage stage.
    async fn try_bind_with_code(
        &self,
        user: &UserProfile,
        code: &str,
    ) -> Result<bool, SupportError> {
        self.sessions.clear(user.user_id);
        match projects::get_by_invite_code(&self.db, code).await? {
            Some(project) => {
                bindings::upsert(
                    &self.db,
                    user.user_id,
                    project.id,
                    user.username.as_deref(),
                    user.display_name.as_deref(),
                )
                .await?;
                info!(user_id = user.user_id, project_id = project.id, "user bound via code");
                self.send(
                    user,
                    &texts::code_accepted(user.greeting_name(), &project.name),
                    Some(keyboards::categories()),
                )
                .await?;
                Ok(true)
            }
            None => {
                warn!(user_id = user.user_id, "invalid invite code");
                self.send(user, texts::INVALID_CODE, Some(keyboards::triage()))
                    .await?;
                Ok(false)
            }
        }
    }

    async fn finish_triage(
        &self,
        user: &UserProfile,
        contact: Option<&str>,
    ) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        info!(
            user_id = user.user_id,
            company = session.fields.company.as_deref().unwrap_or("unknown"),
            contact = contact.unwrap_or("-"),
            "triage completed"
        );
        self.sessions.clear(user.user_id);
        self.send(user, texts::TRIAGE_DONE, None).await
    }

    /// Pre-condition for entering category selection: a current binding.
    /// Absence aborts before any session state is created.
    async fn select_category(
        &self,
        user: &UserProfile,
        category_id: &str,
    ) -> Result<(), SupportError> {
        if catalog::category_by_id(category_id).is_none() {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        }
        let Some(binding) = bindings::current(&self.db, user.user_id).await? else {
            return self.send(user, texts::NOT_BOUND, None).await;
        };

        let session = self.sessions.get(user.user_id).unwrap_or_default();
        if session.stage == Some(Stage::EditingCategory) {
            self.sessions.update(user.user_id, |s| {
                s.fields.category = Some(category_id.to_string());
            });
            return self.show_summary(user).await;
        }

        let category = category_id.to_string();
        let urgent = category_id == "urgent";
        self.sessions.update(user.user_id, |s| {
            s.fields = Default::default();
            s.fields.category = Some(category);
            s.fields.project_id = Some(binding.project_id);
            s.stage = Some(if urgent {
                Stage::AwaitingUrgencyLevel
            } else {
                Stage::AwaitingDescription
            });
        });

        if urgent {
            self.send(user, texts::URGENT_ASK_BLOCKING, Some(keyboards::urgency()))
                .await
        } else {
            self.send(user, texts::ask_description(category_id), None).await
        }
    }

    async fn accept_description(
        &self,
        user: &UserProfile,
        description: String,
    ) -> Result<(), SupportError> {
        self.sessions.update(user.user_id, |s| {
            s.fields.description = Some(description);
            s.stage = Some(Stage::CollectingAttachments);
        });
        self.send(
            user,
            texts::ASK_ATTACHMENTS,
            Some(keyboards::skip_attachments()),
        )
        .await
    }

    async fn require_summary_then(
        &self,
        user: &UserProfile,
        next: Stage,
    ) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        if session.stage != Some(Stage::ShowingSummary) {
            return Ok(());
        }
        self.sessions.update(user.user_id, |s| s.stage = Some(next));
        match next {
            Stage::EditingCategory => {
                self.send(
                    user,
                    texts::EDIT_CATEGORY_PROMPT,
                    Some(keyboards::categories()),
                )
                .await
            }
            Stage::EditingDescription => {
                self.send(user, texts::EDIT_DESCRIPTION_PROMPT, None).await
            }
            _ => Ok(()),
        }
    }

    async fn show_summary(&self, user: &UserProfile) -> Result<(), SupportError> {
        let session = self.sessions.update(user.user_id, |s| {
            s.stage = Some(Stage::ShowingSummary);
        });
        let category = session.fields.category.as_deref().unwrap_or("other");
        let description = session.fields.description.as_deref().unwrap_or("");
        self.send(
            user,
            &texts::summary(category, description, session.fields.attachments.len()),
            Some(keyboards::summary()),
        )
        .await
    }

    /// Create the ticket from accumulated fields. The session is cleared
    /// whether creation succeeds or fails; a notification failure after
    /// the store write never rolls the ticket back.
    async fn submit(&self, user: &UserProfile) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        if session.stage != Some(Stage::ShowingSummary) {
            return Ok(());
        }
        self.sessions.clear(user.user_id);

        let fields = session.fields;
        let (Some(project_id), Some(category)) = (fields.project_id, fields.category.clone())
        else {
            return self.send(user, texts::NOT_BOUND, None).await;
        };
        let priority = if category == "urgent" {
            Priority::Urgent
        } else {
            Priority::Normal
        };
        let new = NewTicket {
            project_id,
            user_id: user.user_id,
            category: category.clone(),
            description: fields.description.clone().unwrap_or_default(),
            priority,
            channel_id: self.routing.support_channel().0,
        };

        let ticket = match self.lifecycle.create(new).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(user_id = user.user_id, error = %e, "ticket creation failed");
                return self.send(user, texts::GENERIC_ERROR, None).await;
            }
        };

        for attachment in &fields.attachments {
            messages::append(
                &self.db,
                NewMessage {
                    ticket_id: ticket.id,
                    direction: MessageDirection::Client,
                    gateway_message_id: attachment.message_id,
                    kind: attachment.kind,
                    content: None,
                    file_handle: Some(attachment.file_handle.clone()),
                    author_user_id: user.user_id,
                },
            )
            .await?;
        }

        // Thread + card + attachment relay are best effort: the ticket is
        // committed either way and the operator listing still shows it.
        if let Err(e) = self
            .routing
            .post_ticket_card(&ticket, &user.sender_label(), fields.attachments.len())
            .await
        {
            warn!(number = ticket.number, error = %e, "ticket card failed");
        } else if let Err(e) = self.routing.send_attachments(&ticket, &fields.attachments).await {
            warn!(number = ticket.number, error = %e, "attachment relay failed");
        }

        self.send(
            user,
            &texts::ticket_created(ticket.number, &category, !self.hours.is_open_now()),
            None,
        )
        .await?;
        self.send(
            user,
            texts::AFTER_TICKET_MENU,
            Some(keyboards::after_ticket_menu()),
        )
        .await
    }

    /// Idle routing: active ticket first, then the reopen-or-new offer,
    /// then the category menu.
    async fn idle_route(
        &self,
        user: &UserProfile,
        content: InboundContent,
    ) -> Result<(), SupportError> {
        if bindings::current(&self.db, user.user_id).await?.is_none() {
            return self.send(user, texts::NOT_BOUND, None).await;
        }

        if let Some(ticket) = tickets::active_for_user(&self.db, user.user_id).await? {
            return self.append_to_ticket(user, &ticket, content).await;
        }

        let cutoff = self.lifecycle.grace_cutoff();
        if let Some(recent) =
            tickets::recent_completed_for_user(&self.db, user.user_id, &cutoff).await?
        {
            return self.send(
                user,
                &texts::reopen_or_new(recent.number),
                Some(keyboards::reopen_or_new(recent.number)),
            )
            .await;
        }

        self.send(user, texts::CHOOSE_CATEGORY, Some(keyboards::categories()))
            .await
    }

    async fn append_to_ticket(
        &self,
        user: &UserProfile,
        ticket: &Ticket,
        content: InboundContent,
    ) -> Result<(), SupportError> {
        messages::append(
            &self.db,
            NewMessage {
                ticket_id: ticket.id,
                direction: MessageDirection::Client,
                gateway_message_id: content.message_id,
                kind: content.kind,
                content: content.text.clone(),
                file_handle: content.file_handle.clone(),
                author_user_id: user.user_id,
            },
        )
        .await?;

        if let Err(e) = self
            .routing
            .forward_client_message(
                ticket,
                ChatId(user.chat_id),
                &user.sender_label(),
                content.message_id,
            )
            .await
        {
            warn!(number = ticket.number, error = %e, "client message relay failed");
        }

        self.send(
            user,
            &texts::appended_to_ticket(ticket.number),
            Some(keyboards::after_ticket_menu()),
        )
        .await
    }

    /// "Reopen" from the reopen-or-new offer: operator-path reopen that
    /// resumes work where it stopped.
    async fn reopen_from_offer(
        &self,
        user: &UserProfile,
        number: i64,
    ) -> Result<(), SupportError> {
        let Some(ticket) = tickets::get_by_number(&self.db, number).await? else {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        };
        if ticket.user_id != user.user_id {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        }
        match self.lifecycle.reopen_by_operator(ticket.id).await {
            Ok(reopened) => {
                if let Err(e) = self
                    .routing
                    .post_thread_note(&reopened, &texts::reopened_note(number))
                    .await
                {
                    warn!(number, error = %e, "reopen note failed");
                }
                self.send(
                    user,
                    &texts::reopen_success(number),
                    Some(keyboards::after_ticket_menu()),
                )
                .await
            }
            Err(_) => self.send(user, texts::GENERIC_ERROR, None).await,
        }
    }

    async fn my_tickets(&self, user: &UserProfile) -> Result<(), SupportError> {
        let all = tickets::for_user(&self.db, user.user_id, 10).await?;
        if all.is_empty() {
            return self.send(
                user,
                texts::MY_TICKETS_EMPTY,
                Some(keyboards::after_ticket_menu()),
            )
            .await;
        }

        let mut lines = vec![texts::MY_TICKETS_HEADER.to_string()];
        let mut kb = Keyboard::new();
        for ticket in &all {
            lines.push(texts::my_tickets_item(ticket));
            if ticket.status.is_active() {
                kb = kb.single(Button::callback(
                    format!("\u{1F4DD} Add details to #{}", ticket.number),
                    CallbackAction::AddDetails(ticket.number),
                ));
                if ticket.status == opsdesk_core::types::TicketStatus::New {
                    kb = kb.single(Button::callback(
                        format!("\u{274C} Cancel #{}", ticket.number),
                        CallbackAction::ClientCancel(ticket.number),
                    ));
                }
            } else if ticket.status == opsdesk_core::types::TicketStatus::Completed
                && self.lifecycle.within_grace(ticket)
            {
                kb = kb.single(Button::callback(
                    format!("\u{1F504} Reopen #{}", ticket.number),
                    CallbackAction::ClientReopen(ticket.number),
                ));
            }
        }
        kb = kb.single(Button::callback(
            "\u{2795} New request",
            CallbackAction::NewRequest,
        ));
        self.send(user, &lines.join("\n"), Some(kb)).await
    }

    async fn client_cancel_offer(
        &self,
        user: &UserProfile,
        number: i64,
    ) -> Result<(), SupportError> {
        match tickets::get_by_number(&self.db, number).await? {
            Some(ticket)
                if ticket.user_id == user.user_id
                    && ticket.status == opsdesk_core::types::TicketStatus::New =>
            {
                self.send(
                    user,
                    &texts::client_cancel_confirm(number),
                    Some(keyboards::client_cancel_confirm(number)),
                )
                .await
            }
            Some(_) => self.send(user, texts::CLIENT_CANCEL_NOT_ALLOWED, None).await,
            None => self.send(user, texts::GENERIC_ERROR, None).await,
        }
    }

    async fn client_cancel_confirm(
        &self,
        user: &UserProfile,
        number: i64,
    ) -> Result<(), SupportError> {
        let Some(ticket) = tickets::get_by_number(&self.db, number).await? else {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        };
        if ticket.user_id != user.user_id {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        }
        match self.lifecycle.client_self_cancel(ticket.id).await {
            Ok(cancelled) => {
                if let Err(e) = self
                    .routing
                    .post_thread_note(&cancelled, &texts::self_cancelled_note(number))
                    .await
                {
                    warn!(number, error = %e, "self-cancel note failed");
                }
                self.send(
                    user,
                    &texts::client_cancel_success(number),
                    Some(keyboards::after_ticket_menu()),
                )
                .await
            }
            Err(SupportError::AlreadyTaken { .. }) => {
                self.send(user, texts::CLIENT_CANCEL_NOT_ALLOWED, None).await
            }
            Err(_) => self.send(user, texts::GENERIC_ERROR, None).await,
        }
    }

    async fn client_reopen_offer(
        &self,
        user: &UserProfile,
        number: i64,
    ) -> Result<(), SupportError> {
        match tickets::get_by_number(&self.db, number).await? {
            Some(ticket)
                if ticket.user_id == user.user_id
                    && ticket.status == opsdesk_core::types::TicketStatus::Completed
                    && self.lifecycle.within_grace(&ticket) =>
            {
                self.send(
                    user,
                    &texts::reopen_confirm(number),
                    Some(keyboards::client_reopen_confirm(number)),
                )
                .await
            }
            Some(_) => self.send(user, texts::REOPEN_TOO_OLD, None).await,
            None => self.send(user, texts::GENERIC_ERROR, None).await,
        }
    }

    async fn client_reopen_confirm(
        &self,
        user: &UserProfile,
        number: i64,
    ) -> Result<(), SupportError> {
        let Some(ticket) = tickets::get_by_number(&self.db, number).await? else {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        };
        if ticket.user_id != user.user_id {
            return self.send(user, texts::GENERIC_ERROR, None).await;
        }
        match self.lifecycle.reopen_by_client(ticket.id).await {
            Ok(reopened) => {
                if let Err(e) = self
                    .routing
                    .post_thread_note(&reopened, &texts::reopened_note(number))
                    .await
                {
                    warn!(number, error = %e, "reopen note failed");
                }
                self.send(
                    user,
                    &texts::reopen_success(number),
                    Some(keyboards::after_ticket_menu()),
                )
                .await
            }
            Err(SupportError::IllegalTransition { .. }) => {
                self.send(user, texts::REOPEN_TOO_OLD, None).await
            }
            Err(_) => self.send(user, texts::GENERIC_ERROR, None).await,
        }
    }
}
