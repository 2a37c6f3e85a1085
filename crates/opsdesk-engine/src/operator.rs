// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator action orchestrator.
//!
//! Handles card button presses (take/pause/resume/close/cancel/details),
//! the reason-capture sub-flows behind pause/cancel/details, and the
//! forwarding of operator thread messages to clients. The allow-list is
//! immutable configuration passed in at construction.

use std::sync::Arc;

use opsdesk_core::SupportError;
use opsdesk_core::action::CallbackAction;
use opsdesk_core::keyboard::{Button, Keyboard};
use opsdesk_core::types::{ChatId, ThreadId, Ticket};
use opsdesk_storage::Database;
use opsdesk_storage::queries::tickets;
use tracing::{debug, info, warn};

use crate::conversation::UserProfile;
use crate::keyboards;
use crate::lifecycle::TicketLifecycle;
use crate::routing::{InboundContent, RoutingService, StatusNotice};
use crate::session::{ReasonKind, ReasonTarget, SessionStore};
use crate::stage::Stage;
use crate::texts;

/// Operator-side state machine.
pub struct OperatorFlow {
    db: Arc<Database>,
    sessions: Arc<SessionStore>,
    lifecycle: Arc<TicketLifecycle>,
    routing: Arc<RoutingService>,
    operators: Vec<i64>,
}

impl OperatorFlow {
    pub fn new(
        db: Arc<Database>,
        sessions: Arc<SessionStore>,
        lifecycle: Arc<TicketLifecycle>,
        routing: Arc<RoutingService>,
        operators: Vec<i64>,
    ) -> Self {
        Self {
            db,
            sessions,
            lifecycle,
            routing,
            operators,
        }
    }

    pub fn is_operator(&self, user_id: i64) -> bool {
        self.operators.contains(&user_id)
    }

    async fn alert(&self, callback_id: &str, text: &str) {
        // Alerts are feedback on a pressed button; losing one is not worth
        // failing the action over.
        if let Err(e) = self
            .routing
            .gateway()
            .answer_callback(callback_id, Some(text), true)
            .await
        {
            warn!(error = %e, "callback alert failed");
        }
    }

    async fn reply_in_thread(
        &self,
        thread: ThreadId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), SupportError> {
        self.routing
            .gateway()
            .send_in_thread(self.routing.support_channel(), thread, text, keyboard)
            .await?;
        Ok(())
    }

    /// A button press on a ticket card inside the support workspace.
    pub async fn on_callback(
        &self,
        operator: &UserProfile,
        callback_id: &str,
        thread_id: Option<i64>,
        action: CallbackAction,
    ) -> Result<(), SupportError> {
        if !self.is_operator(operator.user_id) {
            warn!(
                user_id = operator.user_id,
                "operator button pressed by non-operator"
            );
            self.alert(callback_id, &texts::operator_need_id(operator.user_id))
                .await;
            return Ok(());
        }

        match action {
            CallbackAction::OpTake(ticket_id) => {
                self.take(operator, callback_id, thread_id, ticket_id).await
            }
            CallbackAction::OpPause(ticket_id) => {
                self.start_reason_capture(callback_id, thread_id, ticket_id, ReasonKind::Pause, operator)
                    .await
            }
            CallbackAction::OpCancel(ticket_id) => {
                self.start_reason_capture(callback_id, thread_id, ticket_id, ReasonKind::Cancel, operator)
                    .await
            }
            CallbackAction::OpDetails(ticket_id) => {
                self.start_reason_capture(callback_id, thread_id, ticket_id, ReasonKind::Details, operator)
                    .await
            }
            CallbackAction::OpResume(ticket_id) => {
                match self.lifecycle.resume(ticket_id).await {
                    Ok(ticket) => {
                        self.notify_client(&ticket, StatusNotice::Resumed).await;
                        if let Some(thread) = thread_id {
                            self.reply_in_thread(
                                ThreadId(thread),
                                texts::RESUMED_CONFIRM,
                                Some(keyboards::ticket_actions(&ticket)),
                            )
                            .await?;
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.render_action_error(callback_id, e).await;
                        Ok(())
                    }
                }
            }
            CallbackAction::OpClose(ticket_id) => {
                match self.lifecycle.close(ticket_id).await {
                    Ok(ticket) => {
                        self.notify_client(&ticket, StatusNotice::Closed).await;
                        if let Some(thread) = thread_id {
                            self.reply_in_thread(ThreadId(thread), texts::CLOSED_CONFIRM, None)
                                .await?;
                        }
                        info!(number = ticket.number, operator = operator.user_id, "ticket closed");
                        Ok(())
                    }
                    Err(e) => {
                        self.render_action_error(callback_id, e).await;
                        Ok(())
                    }
                }
            }
            CallbackAction::OpMyTickets => self.my_tickets(operator).await,
            _ => Ok(()),
        }
    }

    async fn take(
        &self,
        operator: &UserProfile,
        callback_id: &str,
        thread_id: Option<i64>,
        ticket_id: i64,
    ) -> Result<(), SupportError> {
        match self.lifecycle.claim(ticket_id, operator.user_id).await {
            Ok(ticket) => {
                self.notify_client(&ticket, StatusNotice::InProgress).await;
                if let Some(thread) = thread_id {
                    self.reply_in_thread(
                        ThreadId(thread),
                        &texts::taken_status(&ticket, &operator.sender_label()),
                        Some(keyboards::ticket_actions(&ticket)),
                    )
                    .await?;
                }
                info!(number = ticket.number, operator = operator.user_id, "ticket taken");
                Ok(())
            }
            Err(SupportError::AlreadyTaken { number }) => {
                self.alert(callback_id, &texts::already_taken(number)).await;
                Ok(())
            }
            Err(SupportError::NotFound { .. }) => {
                self.alert(callback_id, texts::TICKET_NOT_FOUND).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Remember which ticket and thread the next free-text reply belongs
    /// to, then prompt for it.
    async fn start_reason_capture(
        &self,
        callback_id: &str,
        thread_id: Option<i64>,
        ticket_id: i64,
        kind: ReasonKind,
        operator: &UserProfile,
    ) -> Result<(), SupportError> {
        let Some(ticket) = tickets::get(&self.db, ticket_id).await? else {
            self.alert(callback_id, texts::TICKET_NOT_FOUND).await;
            return Ok(());
        };
        let Some(thread) = thread_id.or(ticket.thread_id) else {
            self.alert(callback_id, texts::GENERIC_ERROR).await;
            return Ok(());
        };

        let (stage, prompt) = match kind {
            ReasonKind::Pause => (
                Stage::AwaitingPauseReason,
                texts::ask_pause_reason(ticket.number),
            ),
            ReasonKind::Cancel => (
                Stage::AwaitingCancelReason,
                texts::ask_cancel_reason(ticket.number),
            ),
            ReasonKind::Details => (
                Stage::AwaitingDetailsQuestion,
                texts::ask_details_question(ticket.number),
            ),
        };

        self.sessions.update(operator.user_id, |s| {
            s.stage = Some(stage);
            s.fields.reason_target = Some(ReasonTarget {
                kind,
                ticket_id: ticket.id,
                ticket_number: ticket.number,
                client_chat_id: ticket.user_id,
                thread_id: thread,
            });
        });
        self.reply_in_thread(ThreadId(thread), &prompt, None).await
    }

    /// A message from an operator inside a support thread: either the
    /// pending reason-capture reply, or a reply to relay to the client.
    pub async fn on_thread_message(
        &self,
        operator: &UserProfile,
        thread_id: i64,
        content: InboundContent,
    ) -> Result<(), SupportError> {
        if !self.is_operator(operator.user_id) {
            debug!(
                user_id = operator.user_id,
                thread_id, "ignoring non-operator thread message"
            );
            return Ok(());
        }

        let session = self.sessions.get(operator.user_id).unwrap_or_default();
        if let (Some(stage), Some(target)) = (session.stage, session.fields.reason_target.clone())
            && stage.is_operator_stage()
        {
            // A reply is only accepted from the thread that asked for it;
            // text typed in any other thread is a normal relay there.
            if target.thread_id == thread_id {
                let Some(reason) = content.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
                else {
                    return Ok(());
                };
                self.sessions.clear(operator.user_id);
                return self.finish_reason_capture(operator, target, reason).await;
            }
        }

        self.relay_to_client(operator, thread_id, content).await
    }

    async fn finish_reason_capture(
        &self,
        operator: &UserProfile,
        target: ReasonTarget,
        reason: &str,
    ) -> Result<(), SupportError> {
        let thread = ThreadId(target.thread_id);
        match target.kind {
            ReasonKind::Pause => match self.lifecycle.pause(target.ticket_id).await {
                Ok(ticket) => {
                    self.notify_client(
                        &ticket,
                        StatusNotice::OnHold {
                            reason: reason.to_string(),
                        },
                    )
                    .await;
                    self.reply_in_thread(
                        thread,
                        &texts::paused_confirm(target.ticket_number),
                        Some(keyboards::ticket_actions(&ticket)),
                    )
                    .await
                }
                Err(e) => {
                    warn!(number = target.ticket_number, error = %e, "pause failed");
                    self.reply_in_thread(thread, texts::GENERIC_ERROR, None).await
                }
            },
            ReasonKind::Cancel => match self.lifecycle.cancel(target.ticket_id, reason).await {
                Ok(ticket) => {
                    self.notify_client(
                        &ticket,
                        StatusNotice::Cancelled {
                            reason: reason.to_string(),
                        },
                    )
                    .await;
                    self.reply_in_thread(thread, texts::CANCELLED_CONFIRM, None).await
                }
                Err(e) => {
                    warn!(number = target.ticket_number, error = %e, "cancel failed");
                    self.reply_in_thread(thread, texts::GENERIC_ERROR, None).await
                }
            },
            ReasonKind::Details => {
                let question = texts::details_request(target.ticket_number, reason);
                match self
                    .routing
                    .gateway()
                    .send_text(
                        ChatId(target.client_chat_id),
                        &question,
                        Some(keyboards::after_ticket_menu()),
                    )
                    .await
                {
                    Ok(_) => {
                        self.reply_in_thread(thread, texts::DETAILS_SENT_CONFIRM, None).await
                    }
                    Err(e) => {
                        warn!(number = target.ticket_number, error = %e, "details send failed");
                        self.reply_in_thread(thread, texts::GENERIC_ERROR, None).await
                    }
                }
            }
        }
    }

    async fn relay_to_client(
        &self,
        operator: &UserProfile,
        thread_id: i64,
        content: InboundContent,
    ) -> Result<(), SupportError> {
        let channel = self.routing.support_channel();
        let Some(ticket) = self
            .routing
            .ticket_for_thread(ThreadId(thread_id), channel)
            .await?
        else {
            debug!(thread_id, "no ticket for thread, ignoring message");
            return Ok(());
        };

        let message_id = content.message_id;
        let delivered = self
            .routing
            .forward_operator_reply(&ticket, &content, operator.user_id)
            .await?;
        if delivered {
            // Confirmation reaction is cosmetic.
            if let Err(e) = self
                .routing
                .gateway()
                .react(channel, message_id, "\u{2705}")
                .await
            {
                debug!(error = %e, "reaction failed");
            }
        }
        Ok(())
    }

    /// `/mytickets` -- active tickets assigned to this operator.
    pub async fn my_tickets(&self, operator: &UserProfile) -> Result<(), SupportError> {
        if !self.is_operator(operator.user_id) {
            return Ok(());
        }
        let assigned = tickets::active_for_operator(&self.db, operator.user_id, 20).await?;
        let text = self.listing(texts::OPERATOR_MY_TICKETS_HEADER, texts::OPERATOR_NO_TICKETS, &assigned);
        let keyboard = self.listing_keyboard(&assigned);
        self.routing
            .gateway()
            .send_text(ChatId(operator.user_id), &text, keyboard)
            .await?;
        Ok(())
    }

    /// `/unassigned` -- new tickets nobody claimed yet.
    pub async fn unassigned(&self, operator: &UserProfile) -> Result<(), SupportError> {
        if !self.is_operator(operator.user_id) {
            return Ok(());
        }
        let open = tickets::unassigned(&self.db, 20).await?;
        let text = self.listing(
            texts::OPERATOR_UNASSIGNED_HEADER,
            texts::OPERATOR_NO_UNASSIGNED,
            &open,
        );
        let keyboard = self.listing_keyboard(&open);
        self.routing
            .gateway()
            .send_text(ChatId(operator.user_id), &text, keyboard)
            .await?;
        Ok(())
    }

    fn listing(&self, header: &str, empty: &str, list: &[Ticket]) -> String {
        if list.is_empty() {
            return format!("{header}\n{empty}");
        }
        let mut lines = vec![header.to_string()];
        lines.extend(list.iter().map(texts::operator_ticket_item));
        lines.join("\n")
    }

    /// Deep-link buttons into each ticket's thread.
    fn listing_keyboard(&self, list: &[Ticket]) -> Option<Keyboard> {
        let mut kb = Keyboard::new();
        let mut row = Vec::new();
        for ticket in list {
            let Some(thread_id) = ticket.thread_id else {
                continue;
            };
            // Telegram internal links strip the -100 supergroup prefix.
            let channel = ticket
                .channel_id
                .to_string()
                .trim_start_matches("-100")
                .to_string();
            row.push(Button::url(
                format!("\u{1F517} #{}", ticket.number),
                format!("https://t.me/c/{channel}/{thread_id}"),
            ));
            if row.len() == 3 {
                kb = kb.row(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            kb = kb.row(row);
        }
        (!kb.is_empty()).then_some(kb)
    }

    async fn notify_client(&self, ticket: &Ticket, notice: StatusNotice) {
        // Per the error policy: the status change is committed; a failed
        // notice is logged, never rolled back or retried.
        if let Err(e) = self.routing.notify_status(ticket, notice).await {
            warn!(number = ticket.number, error = %e, "status notice failed");
        }
    }

    async fn render_action_error(&self, callback_id: &str, error: SupportError) {
        let message = match &error {
            SupportError::NotFound { .. } => texts::TICKET_NOT_FOUND.to_string(),
            SupportError::AlreadyTaken { number } => texts::already_taken(*number),
            SupportError::IllegalTransition { .. } => texts::TICKET_NOT_ACTIVE.to_string(),
            _ => texts::GENERIC_ERROR.to_string(),
        };
        self.alert(callback_id, &message).await;
    }
}
