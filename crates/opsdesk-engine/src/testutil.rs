// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles shared across the engine's test modules.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use opsdesk_core::keyboard::{ButtonAction, Keyboard};
use opsdesk_core::types::{Attachment, ChatId, ThreadId};
use opsdesk_core::{CallbackAction, SupportError, SupportGateway};
use opsdesk_storage::Database;
use opsdesk_storage::queries::{clients, projects};

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub enum Effect {
    Text {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    AttachmentSent {
        chat: ChatId,
        attachment: Attachment,
        caption: Option<String>,
    },
    ThreadCreated {
        channel: ChatId,
        name: String,
        thread: ThreadId,
    },
    ThreadText {
        channel: ChatId,
        thread: ThreadId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    ThreadAttachment {
        channel: ChatId,
        thread: ThreadId,
        attachment: Attachment,
    },
    Forwarded {
        channel: ChatId,
        thread: ThreadId,
        from_chat: ChatId,
        message_id: i64,
    },
    Reacted {
        chat: ChatId,
        message_id: i64,
        emoji: String,
    },
    CallbackAnswered {
        callback_id: String,
        text: Option<String>,
        alert: bool,
    },
}

/// Gateway double that records every outbound effect.
pub struct RecordingGateway {
    effects: Mutex<Vec<Effect>>,
    next_thread: AtomicI64,
    next_message: AtomicI64,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            effects: Mutex::new(Vec::new()),
            next_thread: AtomicI64::new(1000),
            next_message: AtomicI64::new(1),
        }
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.effects.lock().unwrap().clear();
    }

    fn record(&self, effect: Effect) {
        self.effects.lock().unwrap().push(effect);
    }

    pub fn count_created_threads(&self) -> usize {
        self.effects()
            .iter()
            .filter(|e| matches!(e, Effect::ThreadCreated { .. }))
            .count()
    }

    /// Texts sent directly to a chat, in order.
    pub fn sent_texts_to(&self, chat: ChatId) -> Vec<String> {
        self.effects()
            .iter()
            .filter_map(|e| match e {
                Effect::Text { chat: c, text, .. } if *c == chat => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts sent into any thread, in order.
    pub fn thread_texts(&self) -> Vec<String> {
        self.effects()
            .iter()
            .filter_map(|e| match e {
                Effect::ThreadText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Did the most recently sent keyboard carry the given action?
    pub fn last_keyboard_had_callback(&self, action: &CallbackAction) -> bool {
        let effects = self.effects();
        let last_keyboard = effects.iter().rev().find_map(|e| match e {
            Effect::Text {
                keyboard: Some(kb), ..
            }
            | Effect::ThreadText {
                keyboard: Some(kb), ..
            } => Some(kb.clone()),
            _ => None,
        });
        let Some(kb) = last_keyboard else {
            return false;
        };
        kb.rows
            .iter()
            .flatten()
            .any(|b| b.action == ButtonAction::Callback(action.clone()))
    }

    /// Does any sent keyboard carry the given action?
    pub fn any_keyboard_had_callback(&self, action: &CallbackAction) -> bool {
        self.effects().iter().any(|e| {
            let kb = match e {
                Effect::Text {
                    keyboard: Some(kb), ..
                }
                | Effect::ThreadText {
                    keyboard: Some(kb), ..
                } => kb,
                _ => return false,
            };
            kb.rows
                .iter()
                .flatten()
                .any(|b| b.action == ButtonAction::Callback(action.clone()))
        })
    }
}

#[async_trait]
impl SupportGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError> {
        self.record(Effect::Text {
            chat,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.next_message.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_attachment(
        &self,
        chat: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
    ) -> Result<(), SupportError> {
        self.record(Effect::AttachmentSent {
            chat,
            attachment: attachment.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn create_thread(
        &self,
        channel: ChatId,
        name: &str,
    ) -> Result<ThreadId, SupportError> {
        let thread = ThreadId(self.next_thread.fetch_add(1, Ordering::SeqCst));
        self.record(Effect::ThreadCreated {
            channel,
            name: name.to_string(),
            thread,
        });
        Ok(thread)
    }

    async fn send_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError> {
        self.record(Effect::ThreadText {
            channel,
            thread,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.next_message.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_attachment_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        attachment: &Attachment,
    ) -> Result<(), SupportError> {
        self.record(Effect::ThreadAttachment {
            channel,
            thread,
            attachment: attachment.clone(),
        });
        Ok(())
    }

    async fn forward_into_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        from_chat: ChatId,
        message_id: i64,
    ) -> Result<(), SupportError> {
        self.record(Effect::Forwarded {
            channel,
            thread,
            from_chat,
            message_id,
        });
        Ok(())
    }

    async fn react(
        &self,
        chat: ChatId,
        message_id: i64,
        emoji: &str,
    ) -> Result<(), SupportError> {
        self.record(Effect::Reacted {
            chat,
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), SupportError> {
        self.record(Effect::CallbackAnswered {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert: show_alert,
        });
        Ok(())
    }
}

/// Seed one client with one invite-coded project; returns (client, project).
pub async fn seed_project(db: &Database) -> (i64, i64) {
    let client = clients::create(db, "Acme").await.unwrap();
    let project = projects::create(db, client.id, "Support", Some("acme"))
        .await
        .unwrap();
    (client.id, project.id)
}
