// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of the channel-agnostic keyboard model into Telegram markup.

use opsdesk_core::keyboard::{ButtonAction, Keyboard};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

/// Convert an engine keyboard into Telegram inline markup.
pub fn render(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.action {
                    ButtonAction::Callback(action) => {
                        InlineKeyboardButton::callback(button.label.clone(), action.encode())
                    }
                    ButtonAction::Url(url) => match url.parse() {
                        Ok(url) => InlineKeyboardButton::url(button.label.clone(), url),
                        Err(e) => {
                            // A broken deep link degrades to a no-op
                            // callback instead of dropping the row.
                            warn!(url, error = %e, "invalid button url");
                            InlineKeyboardButton::callback(button.label.clone(), "noop")
                        }
                    },
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}
