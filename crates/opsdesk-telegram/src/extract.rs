// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content extraction from inbound Telegram messages.
//!
//! Maps teloxide message payloads onto the engine's channel-agnostic
//! shapes. Attachments are relayed by file id, never downloaded.

use opsdesk_core::types::{Attachment, MessageKind};
use opsdesk_engine::UserProfile;
use opsdesk_engine::routing::InboundContent;
use teloxide::types::{ChatKind, Message, User};

/// Is this a direct (private) chat message?
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Build the engine-side identity for a sender.
pub fn profile(user: &User, chat_id: i64) -> UserProfile {
    UserProfile {
        user_id: user.id.0 as i64,
        chat_id,
        username: user.username.clone(),
        display_name: Some(user.full_name()),
    }
}

/// Extract the message payload: text, or one of the supported attachment
/// kinds. `None` for anything else (stickers, locations, polls, ...).
pub fn content(msg: &Message) -> Option<InboundContent> {
    let message_id = i64::from(msg.id.0);

    if let Some(text) = msg.text() {
        return Some(InboundContent {
            kind: MessageKind::Text,
            text: Some(text.to_string()),
            file_handle: None,
            message_id,
        });
    }

    let caption = msg.caption().map(str::to_string);

    // Telegram provides multiple photo sizes; the last one is the largest.
    if let Some(photos) = msg.photo() {
        let largest = photos.last()?;
        return Some(InboundContent {
            kind: MessageKind::Photo,
            text: caption,
            file_handle: Some(largest.file.id.to_string()),
            message_id,
        });
    }
    if let Some(video) = msg.video() {
        return Some(InboundContent {
            kind: MessageKind::Video,
            text: caption,
            file_handle: Some(video.file.id.to_string()),
            message_id,
        });
    }
    if let Some(doc) = msg.document() {
        return Some(InboundContent {
            kind: MessageKind::Document,
            text: caption,
            file_handle: Some(doc.file.id.to_string()),
            message_id,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(InboundContent {
            kind: MessageKind::Voice,
            text: None,
            file_handle: Some(voice.file.id.to_string()),
            message_id,
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(InboundContent {
            kind: MessageKind::Audio,
            text: caption,
            file_handle: Some(audio.file.id.to_string()),
            message_id,
        });
    }

    None
}

/// The attachment view of extracted content, when it carries a file.
pub fn as_attachment(content: &InboundContent) -> Option<Attachment> {
    let handle = content.file_handle.as_ref()?;
    content.kind.is_attachment().then(|| Attachment {
        kind: content.kind,
        file_handle: handle.clone(),
        message_id: content.message_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a mock message from JSON, matching Telegram Bot API structure.
    fn message_from_json(json: serde_json::Value) -> Message {
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn text_message(chat_type: &str, text: &str) -> Message {
        let chat = if chat_type == "private" {
            serde_json::json!({"id": 42, "type": "private", "first_name": "Alice"})
        } else {
            serde_json::json!({"id": -100123, "type": "supergroup", "title": "Support"})
        };
        message_from_json(serde_json::json!({
            "message_id": 5,
            "date": 1700000000i64,
            "chat": chat,
            "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
            "text": text,
        }))
    }

    #[test]
    fn dm_detection() {
        assert!(is_dm(&text_message("private", "hi")));
        assert!(!is_dm(&text_message("supergroup", "hi")));
    }

    #[test]
    fn text_content_extracts() {
        let content = content(&text_message("private", "hello")).unwrap();
        assert_eq!(content.kind, MessageKind::Text);
        assert_eq!(content.text.as_deref(), Some("hello"));
        assert!(content.file_handle.is_none());
        assert_eq!(content.message_id, 5);
        assert!(as_attachment(&content).is_none());
    }

    #[test]
    fn photo_takes_largest_size_with_caption() {
        let msg = message_from_json(serde_json::json!({
            "message_id": 6,
            "date": 1700000000i64,
            "chat": {"id": 42, "type": "private", "first_name": "Alice"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
            "caption": "screenshot",
            "photo": [
                {"file_id": "small", "file_unique_id": "u1", "width": 90, "height": 90, "file_size": 100},
                {"file_id": "large", "file_unique_id": "u2", "width": 900, "height": 900, "file_size": 1000}
            ],
        }));
        let content = content(&msg).unwrap();
        assert_eq!(content.kind, MessageKind::Photo);
        assert_eq!(content.file_handle.as_deref(), Some("large"));
        assert_eq!(content.text.as_deref(), Some("screenshot"));

        let attachment = as_attachment(&content).unwrap();
        assert_eq!(attachment.file_handle, "large");
        assert_eq!(attachment.message_id, 6);
    }

    #[test]
    fn unsupported_payload_is_none() {
        let msg = message_from_json(serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {"id": 42, "type": "private", "first_name": "Alice"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
            "location": {"longitude": 13.4, "latitude": 52.5},
        }));
        assert!(content(&msg).is_none());
    }

    #[test]
    fn profile_carries_identity() {
        let msg = text_message("private", "hi");
        let user = msg.from.as_ref().unwrap();
        let profile = profile(user, 42);
        assert_eq!(profile.user_id, 42);
        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(profile.display_name.as_deref(), Some("Alice"));
        assert_eq!(profile.sender_label(), "Alice (@alice)");
    }
}
