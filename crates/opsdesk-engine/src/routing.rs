// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing and notification layer.
//!
//! Maps every client company onto a single support thread (created lazily,
//! at most once) and carries messages in both directions: client messages
//! into the thread, operator replies back to the client, and templated
//! status notices.

use std::sync::Arc;

use dashmap::DashMap;
use opsdesk_core::catalog;
use opsdesk_core::types::{
    Attachment, ChatId, MessageDirection, MessageKind, ThreadId, Ticket,
};
use opsdesk_core::{SupportError, SupportGateway};
use opsdesk_storage::queries::{clients, messages, projects, tickets};
use opsdesk_storage::{Database, NewMessage};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::keyboards;
use crate::texts;

/// Extracted payload of one inbound gateway message.
#[derive(Debug, Clone)]
pub struct InboundContent {
    pub kind: MessageKind,
    pub text: Option<String>,
    pub file_handle: Option<String>,
    pub message_id: i64,
}

/// Client-facing status notices.
#[derive(Debug, Clone)]
pub enum StatusNotice {
    InProgress,
    OnHold { reason: String },
    Resumed,
    Closed,
    Cancelled { reason: String },
}

/// Thread resolution and bidirectional forwarding.
pub struct RoutingService {
    db: Arc<Database>,
    gateway: Arc<dyn SupportGateway>,
    support_channel: ChatId,
    /// Per-client creation locks: the storage CAS alone would tolerate a
    /// duplicate *gateway* thread under a race; the lock makes creation
    /// at-most-once within this process.
    thread_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl RoutingService {
    pub fn new(db: Arc<Database>, gateway: Arc<dyn SupportGateway>, support_channel: ChatId) -> Self {
        Self {
            db,
            gateway,
            support_channel,
            thread_locks: DashMap::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn SupportGateway> {
        &self.gateway
    }

    pub fn support_channel(&self) -> ChatId {
        self.support_channel
    }

    /// The client's thread, creating it on first use.
    ///
    /// All tickets of one client share this thread. Safe to call
    /// concurrently: the per-client lock serializes creation and the
    /// storage compare-and-set picks a single winner even across
    /// processes.
    pub async fn resolve_thread(&self, client_id: i64) -> Result<ThreadId, SupportError> {
        let client = clients::get(&self.db, client_id)
            .await?
            .ok_or(SupportError::NotFound {
                entity: "client",
                id: client_id,
            })?;
        if let Some(thread_id) = client.thread_id {
            return Ok(ThreadId(thread_id));
        }

        let lock = self
            .thread_locks
            .entry(client_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check under the lock: another resolver may have just won.
        let client = clients::get(&self.db, client_id)
            .await?
            .ok_or(SupportError::NotFound {
                entity: "client",
                id: client_id,
            })?;
        if let Some(thread_id) = client.thread_id {
            return Ok(ThreadId(thread_id));
        }

        let mut name = format!("\u{1F3E2} {}", client.name);
        if name.chars().count() > 120 {
            name = name.chars().take(117).collect::<String>() + "...";
        }
        let thread = self
            .gateway
            .create_thread(self.support_channel, &name)
            .await
            .map_err(|e| SupportError::ThreadUnavailable(e.to_string()))?;

        let stored =
            clients::set_thread_if_absent(&self.db, client_id, thread.0, self.support_channel.0)
                .await?;
        if !stored {
            // Lost a cross-process race; defer to the stored winner.
            if let Some(winner) = clients::get(&self.db, client_id)
                .await?
                .and_then(|c| c.thread_id)
            {
                warn!(client_id, "thread creation raced, using stored thread");
                return Ok(ThreadId(winner));
            }
        }
        debug!(client_id, thread_id = thread.0, "support thread created");
        Ok(thread)
    }

    /// The thread a ticket's conversation lives in, resolving and
    /// persisting it if the ticket predates its client's thread.
    pub async fn ensure_ticket_thread(&self, ticket: &Ticket) -> Result<ThreadId, SupportError> {
        if let Some(thread_id) = ticket.thread_id {
            return Ok(ThreadId(thread_id));
        }
        let (_, client) = projects::get_with_client(&self.db, ticket.project_id)
            .await?
            .ok_or(SupportError::NotFound {
                entity: "project",
                id: ticket.project_id,
            })?;
        let thread = self.resolve_thread(client.id).await?;
        tickets::set_thread(&self.db, ticket.id, thread.0).await?;
        Ok(thread)
    }

    /// Post the structured ticket card with status-appropriate actions.
    pub async fn post_ticket_card(
        &self,
        ticket: &Ticket,
        requester: &str,
        attachments_count: usize,
    ) -> Result<(), SupportError> {
        let thread = self.ensure_ticket_thread(ticket).await?;
        let card = card_text(ticket, requester, attachments_count);
        self.gateway
            .send_in_thread(
                self.support_channel,
                thread,
                &card,
                Some(keyboards::ticket_actions(ticket)),
            )
            .await?;
        Ok(())
    }

    /// Post a context header and relay a client message verbatim into the
    /// ticket's thread.
    pub async fn forward_client_message(
        &self,
        ticket: &Ticket,
        from_chat: ChatId,
        sender: &str,
        message_id: i64,
    ) -> Result<(), SupportError> {
        let thread = self.ensure_ticket_thread(ticket).await?;
        self.gateway
            .send_in_thread(
                self.support_channel,
                thread,
                &texts::forward_header(ticket.number, sender),
                None,
            )
            .await?;
        self.gateway
            .forward_into_thread(self.support_channel, thread, from_chat, message_id)
            .await?;
        Ok(())
    }

    /// Send submission attachments into the ticket's thread.
    pub async fn send_attachments(
        &self,
        ticket: &Ticket,
        attachments: &[Attachment],
    ) -> Result<usize, SupportError> {
        if attachments.is_empty() {
            return Ok(0);
        }
        let thread = self.ensure_ticket_thread(ticket).await?;
        let mut sent = 0;
        for attachment in attachments {
            match self
                .gateway
                .send_attachment_in_thread(self.support_channel, thread, attachment)
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => warn!(ticket = ticket.number, error = %e, "attachment relay failed"),
            }
        }
        Ok(sent)
    }

    /// Persist an operator message against the ticket and relay it to the
    /// client. Messages on terminal tickets are dropped (returns `false`).
    pub async fn forward_operator_reply(
        &self,
        ticket: &Ticket,
        content: &InboundContent,
        operator_id: i64,
    ) -> Result<bool, SupportError> {
        if ticket.status.is_terminal() {
            debug!(number = ticket.number, "dropping reply on terminal ticket");
            return Ok(false);
        }
        messages::append(
            &self.db,
            NewMessage {
                ticket_id: ticket.id,
                direction: MessageDirection::Operator,
                gateway_message_id: content.message_id,
                kind: content.kind,
                content: content.text.clone(),
                file_handle: content.file_handle.clone(),
                author_user_id: operator_id,
            },
        )
        .await?;

        let client_chat = ChatId(ticket.user_id);
        match (&content.file_handle, content.kind) {
            (Some(handle), kind) if kind.is_attachment() => {
                self.gateway
                    .send_attachment(
                        client_chat,
                        &Attachment {
                            kind,
                            file_handle: handle.clone(),
                            message_id: content.message_id,
                        },
                        content.text.as_deref(),
                    )
                    .await?;
            }
            _ => {
                let text = content.text.as_deref().unwrap_or_default();
                self.gateway
                    .send_text(client_chat, &texts::operator_reply(text), None)
                    .await?;
            }
        }
        Ok(true)
    }

    /// Templated status notice to the client; the CSAT prompt rides along
    /// on closure.
    pub async fn notify_status(
        &self,
        ticket: &Ticket,
        notice: StatusNotice,
    ) -> Result<(), SupportError> {
        let chat = ChatId(ticket.user_id);
        let menu = Some(keyboards::after_ticket_menu());
        match notice {
            StatusNotice::InProgress => {
                self.gateway
                    .send_text(chat, &texts::ticket_in_progress(ticket.number), menu)
                    .await?;
            }
            StatusNotice::OnHold { reason } => {
                self.gateway
                    .send_text(chat, &texts::ticket_paused(ticket.number, &reason), menu)
                    .await?;
            }
            StatusNotice::Resumed => {
                self.gateway
                    .send_text(chat, &texts::ticket_resumed(ticket.number), menu)
                    .await?;
            }
            StatusNotice::Closed => {
                self.gateway
                    .send_text(chat, &texts::ticket_closed(ticket.number), None)
                    .await?;
                self.gateway
                    .send_text(chat, texts::CSAT_ASK, Some(keyboards::csat(ticket.id)))
                    .await?;
            }
            StatusNotice::Cancelled { reason } => {
                self.gateway
                    .send_text(chat, &texts::ticket_cancelled(ticket.number, &reason), menu)
                    .await?;
            }
        }
        Ok(())
    }

    /// Drop a plain note into the ticket's thread (reopen/self-cancel
    /// markers, CSAT relay).
    pub async fn post_thread_note(&self, ticket: &Ticket, text: &str) -> Result<(), SupportError> {
        let thread = self.ensure_ticket_thread(ticket).await?;
        self.gateway
            .send_in_thread(self.support_channel, thread, text, None)
            .await?;
        Ok(())
    }

    /// Resolve the ticket an operator-side thread message belongs to.
    pub async fn ticket_for_thread(
        &self,
        thread: ThreadId,
        channel: ChatId,
    ) -> Result<Option<Ticket>, SupportError> {
        tickets::get_by_thread(&self.db, thread.0, channel.0).await
    }
}

fn card_text(ticket: &Ticket, requester: &str, attachments_count: usize) -> String {
    let priority_emoji = match ticket.priority {
        opsdesk_core::types::Priority::Urgent => "\u{1F6A8}",
        opsdesk_core::types::Priority::Normal => "\u{1F4CB}",
    };
    let attachments = if attachments_count > 0 {
        format!("yes ({attachments_count})")
    } else {
        "no".to_string()
    };
    format!(
        "{priority_emoji} <b>Ticket:</b> #{}\n\
         \u{1F4AC} <b>Requester:</b> {requester}\n\
         \u{1F4C1} <b>Category:</b> {}\n\
         \u{1F525} <b>Priority:</b> {}\n\
         \u{1F550} <b>Created:</b> {}\n\n\
         \u{1F4DD} <b>Description:</b>\n{}\n\n\
         \u{1F4CE} <b>Attachments:</b> {attachments}\n\n\
         \u{1F4CA} <b>Status:</b> {}",
        ticket.number,
        catalog::category_label(&ticket.category),
        ticket.priority,
        ticket.created_at,
        ticket.description.as_deref().unwrap_or(""),
        ticket.status,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Effect, RecordingGateway, seed_project};
    use opsdesk_core::types::{NewTicket, Priority};
    use tempfile::tempdir;

    async fn setup() -> (
        Arc<Database>,
        Arc<RecordingGateway>,
        RoutingService,
        i64,
        i64,
        tempfile::TempDir,
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Arc::new(Database::open(path.to_str().unwrap(), true).await.unwrap());
        let (client_id, project_id) = seed_project(&db).await;
        let gateway = Arc::new(RecordingGateway::new());
        let routing = RoutingService::new(db.clone(), gateway.clone(), ChatId(-100));
        (db, gateway, routing, client_id, project_id, dir)
    }

    async fn make_ticket(db: &Database, project_id: i64) -> Ticket {
        tickets::create(
            db,
            NewTicket {
                project_id,
                user_id: 42,
                category: "billing".into(),
                description: "Need invoice for March".into(),
                priority: Priority::Normal,
                channel_id: -100,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn resolve_thread_creates_once_then_reuses() {
        let (_db, gateway, routing, client_id, _project_id, _dir) = setup().await;

        let first = routing.resolve_thread(client_id).await.unwrap();
        let second = routing.resolve_thread(client_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.count_created_threads(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_create_underlying_thread_at_most_once() {
        let (_db, gateway, routing, client_id, _project_id, _dir) = setup().await;
        let routing = Arc::new(routing);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let routing = routing.clone();
            handles.push(tokio::spawn(
                async move { routing.resolve_thread(client_id).await },
            ));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "every resolver sees the same thread");
        assert_eq!(gateway.count_created_threads(), 1);
    }

    #[tokio::test]
    async fn resolve_thread_unknown_client_is_not_found() {
        let (_db, _gateway, routing, _client_id, _project_id, _dir) = setup().await;
        assert!(matches!(
            routing.resolve_thread(404).await,
            Err(SupportError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ticket_card_lands_in_client_thread() {
        let (db, gateway, routing, _client_id, project_id, _dir) = setup().await;
        let ticket = make_ticket(&db, project_id).await;

        routing.post_ticket_card(&ticket, "@alice", 2).await.unwrap();

        let effects = gateway.effects();
        let cards: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::ThreadText { text, .. } if text.contains("Ticket:") => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].contains("#1"));
        assert!(cards[0].contains("@alice"));
        assert!(cards[0].contains("yes (2)"));

        // The ticket now remembers its thread.
        let stored = tickets::get(&db, ticket.id).await.unwrap().unwrap();
        assert!(stored.thread_id.is_some());
    }

    #[tokio::test]
    async fn operator_reply_persists_and_relays() {
        let (db, gateway, routing, _client_id, project_id, _dir) = setup().await;
        let ticket = make_ticket(&db, project_id).await;

        let delivered = routing
            .forward_operator_reply(
                &ticket,
                &InboundContent {
                    kind: MessageKind::Text,
                    text: Some("On it, checking now".into()),
                    file_handle: None,
                    message_id: 901,
                },
                7,
            )
            .await
            .unwrap();
        assert!(delivered);

        let history = messages::for_ticket(&db, ticket.id, 100).await.unwrap();
        assert_eq!(history.len(), 2); // description + reply
        assert_eq!(history[1].direction, MessageDirection::Operator);
        assert_eq!(history[1].author_user_id, 7);

        assert!(gateway.sent_texts_to(ChatId(42)).iter().any(|t| t.contains("On it")));
    }

    #[tokio::test]
    async fn operator_reply_on_terminal_ticket_is_dropped() {
        let (db, gateway, routing, _client_id, project_id, _dir) = setup().await;
        let ticket = make_ticket(&db, project_id).await;
        let closed = tickets::set_status(&db, ticket.id, opsdesk_core::types::TicketStatus::Completed)
            .await
            .unwrap()
            .unwrap();

        let delivered = routing
            .forward_operator_reply(
                &closed,
                &InboundContent {
                    kind: MessageKind::Text,
                    text: Some("too late".into()),
                    file_handle: None,
                    message_id: 902,
                },
                7,
            )
            .await
            .unwrap();
        assert!(!delivered);
        assert_eq!(messages::for_ticket(&db, ticket.id, 100).await.unwrap().len(), 1);
        assert!(gateway.sent_texts_to(ChatId(42)).is_empty());
    }

    #[tokio::test]
    async fn closed_notice_attaches_csat_prompt() {
        let (db, gateway, routing, _client_id, project_id, _dir) = setup().await;
        let ticket = make_ticket(&db, project_id).await;

        routing.notify_status(&ticket, StatusNotice::Closed).await.unwrap();

        let texts_sent = gateway.sent_texts_to(ChatId(42));
        assert_eq!(texts_sent.len(), 2);
        assert!(texts_sent[1].contains("rate"));
        assert!(gateway.last_keyboard_had_callback(&opsdesk_core::CallbackAction::CsatPositive(
            ticket.id
        )));
    }

    #[tokio::test]
    async fn forward_client_message_sends_header_then_forwards() {
        let (db, gateway, routing, _client_id, project_id, _dir) = setup().await;
        let ticket = make_ticket(&db, project_id).await;

        routing
            .forward_client_message(&ticket, ChatId(42), "Alice (@alice)", 333)
            .await
            .unwrap();

        let effects = gateway.effects();
        let header_pos = effects.iter().position(|e| {
            matches!(e, Effect::ThreadText { text, .. } if text.contains("New message on ticket #1"))
        });
        let forward_pos = effects
            .iter()
            .position(|e| matches!(e, Effect::Forwarded { message_id: 333, .. }));
        assert!(header_pos.unwrap() < forward_pos.unwrap());
    }
}
