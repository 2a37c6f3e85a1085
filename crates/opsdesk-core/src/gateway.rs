// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging-gateway trait: the boundary between the flows and the
//! transport (Telegram in production, a recording mock in tests).
//!
//! The engine only needs these seven operations; exact wire framing is
//! the adapter's business.

use async_trait::async_trait;

use crate::error::SupportError;
use crate::keyboard::Keyboard;
use crate::types::{Attachment, ChatId, ThreadId};

/// Outbound side of the messaging gateway.
#[async_trait]
pub trait SupportGateway: Send + Sync + 'static {
    /// Send a text message (optionally with an inline keyboard) to a chat.
    /// Returns the gateway message id.
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError>;

    /// Send an attachment by its opaque file handle to a chat.
    async fn send_attachment(
        &self,
        chat: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
    ) -> Result<(), SupportError>;

    /// Create a new thread (forum topic) under the operator channel.
    async fn create_thread(&self, channel: ChatId, name: &str)
        -> Result<ThreadId, SupportError>;

    /// Send a text message into a thread of the operator channel.
    async fn send_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError>;

    /// Send an attachment into a thread of the operator channel.
    async fn send_attachment_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        attachment: &Attachment,
    ) -> Result<(), SupportError>;

    /// Forward an existing message by reference into a thread.
    async fn forward_into_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        from_chat: ChatId,
        message_id: i64,
    ) -> Result<(), SupportError>;

    /// React to a message. Best effort: callers swallow failures.
    async fn react(&self, chat: ChatId, message_id: i64, emoji: &str)
        -> Result<(), SupportError>;

    /// Answer a button press, optionally as an alert popup.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), SupportError>;
}
