// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram gateway adapter for the Opsdesk support bot.
//!
//! Implements [`SupportGateway`] over the Telegram Bot API via teloxide:
//! HTML-formatted sends with inline keyboards, forum topics as per-client
//! support threads, message forwarding by reference, and best-effort
//! reactions. Update dispatch into the engine lives in [`dispatch`].

pub mod dispatch;
pub mod extract;
pub mod keyboards;

use async_trait::async_trait;
use opsdesk_core::error::SupportError;
use opsdesk_core::gateway::SupportGateway;
use opsdesk_core::keyboard::Keyboard;
use opsdesk_core::types::{Attachment, ChatId, MessageKind, ThreadId};
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, FileId, InputFile, ParseMode, ReactionType, Recipient,
};
use tracing::debug;

/// Telegram implementation of the outbound gateway.
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Creates the gateway. Requires a non-empty bot token.
    pub fn new(token: &str) -> Result<Self, SupportError> {
        if token.trim().is_empty() {
            return Err(SupportError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// The underlying teloxide bot, for dispatcher construction.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    fn recipient(chat: ChatId) -> Recipient {
        Recipient::Id(teloxide::types::ChatId(chat.0))
    }

    fn thread(thread: ThreadId) -> teloxide::types::ThreadId {
        teloxide::types::ThreadId(teloxide::types::MessageId(thread.0 as i32))
    }

    fn input_file(attachment: &Attachment) -> InputFile {
        InputFile::file_id(FileId(attachment.file_handle.clone()))
    }

    fn send_err(e: teloxide::RequestError) -> SupportError {
        SupportError::Gateway {
            message: format!("telegram send failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl SupportGateway for TelegramGateway {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError> {
        let mut request = self
            .bot
            .send_message(Self::recipient(chat), text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            request = request.reply_markup(keyboards::render(&kb));
        }
        let sent = request.await.map_err(Self::send_err)?;
        Ok(i64::from(sent.id.0))
    }

    async fn send_attachment(
        &self,
        chat: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
    ) -> Result<(), SupportError> {
        let recipient = Self::recipient(chat);
        let file = Self::input_file(attachment);
        match attachment.kind {
            MessageKind::Photo => {
                let mut request = self.bot.send_photo(recipient, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await.map_err(Self::send_err)?;
            }
            MessageKind::Video => {
                let mut request = self.bot.send_video(recipient, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await.map_err(Self::send_err)?;
            }
            MessageKind::Voice => {
                self.bot.send_voice(recipient, file).await.map_err(Self::send_err)?;
            }
            MessageKind::Audio => {
                let mut request = self.bot.send_audio(recipient, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await.map_err(Self::send_err)?;
            }
            // Documents double as the fallback for anything else carrying
            // a file handle.
            MessageKind::Document | MessageKind::Text => {
                let mut request = self.bot.send_document(recipient, file);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await.map_err(Self::send_err)?;
            }
        }
        Ok(())
    }

    async fn create_thread(
        &self,
        channel: ChatId,
        name: &str,
    ) -> Result<ThreadId, SupportError> {
        let topic = self
            .bot
            .create_forum_topic(Self::recipient(channel), name)
            .await
            .map_err(|e| SupportError::ThreadUnavailable(format!("create topic: {e}")))?;
        let thread_id = i64::from(topic.thread_id.0.0);
        debug!(channel = channel.0, thread_id, "forum topic created");
        Ok(ThreadId(thread_id))
    }

    async fn send_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, SupportError> {
        let mut request = self
            .bot
            .send_message(Self::recipient(channel), text)
            .parse_mode(ParseMode::Html)
            .message_thread_id(Self::thread(thread));
        if let Some(kb) = keyboard {
            request = request.reply_markup(keyboards::render(&kb));
        }
        let sent = request.await.map_err(Self::send_err)?;
        Ok(i64::from(sent.id.0))
    }

    async fn send_attachment_in_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        attachment: &Attachment,
    ) -> Result<(), SupportError> {
        let recipient = Self::recipient(channel);
        let file = Self::input_file(attachment);
        let thread = Self::thread(thread);
        match attachment.kind {
            MessageKind::Photo => {
                self.bot
                    .send_photo(recipient, file)
                    .message_thread_id(thread)
                    .await
                    .map_err(Self::send_err)?;
            }
            MessageKind::Video => {
                self.bot
                    .send_video(recipient, file)
                    .message_thread_id(thread)
                    .await
                    .map_err(Self::send_err)?;
            }
            MessageKind::Voice => {
                self.bot
                    .send_voice(recipient, file)
                    .message_thread_id(thread)
                    .await
                    .map_err(Self::send_err)?;
            }
            MessageKind::Audio => {
                self.bot
                    .send_audio(recipient, file)
                    .message_thread_id(thread)
                    .await
                    .map_err(Self::send_err)?;
            }
            MessageKind::Document | MessageKind::Text => {
                self.bot
                    .send_document(recipient, file)
                    .message_thread_id(thread)
                    .await
                    .map_err(Self::send_err)?;
            }
        }
        Ok(())
    }

    async fn forward_into_thread(
        &self,
        channel: ChatId,
        thread: ThreadId,
        from_chat: ChatId,
        message_id: i64,
    ) -> Result<(), SupportError> {
        self.bot
            .forward_message(
                Self::recipient(channel),
                Self::recipient(from_chat),
                teloxide::types::MessageId(message_id as i32),
            )
            .message_thread_id(Self::thread(thread))
            .await
            .map_err(Self::send_err)?;
        Ok(())
    }

    async fn react(
        &self,
        chat: ChatId,
        message_id: i64,
        emoji: &str,
    ) -> Result<(), SupportError> {
        self.bot
            .set_message_reaction(
                Self::recipient(chat),
                teloxide::types::MessageId(message_id as i32),
            )
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(Self::send_err)?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), SupportError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text).show_alert(show_alert);
        }
        request.await.map_err(Self::send_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramGateway::new("").is_err());
        assert!(TelegramGateway::new("   ").is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramGateway::new("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").is_ok());
    }

    #[test]
    fn thread_id_round_trips() {
        let thread = TelegramGateway::thread(ThreadId(555));
        assert_eq!(thread.0.0, 555);
    }
}
