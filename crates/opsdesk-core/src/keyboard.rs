// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel-agnostic inline keyboard model.
//!
//! The engine builds keyboards out of typed [`CallbackAction`]s; the
//! channel adapter renders them into its native markup.

use crate::action::CallbackAction;

/// An inline keyboard: rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Dispatches a typed callback back into the bot.
    Callback(CallbackAction),
    /// Opens an external link (deep links into the operator workspace).
    Url(String),
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Append a single-button row.
    pub fn single(self, button: Button) -> Self {
        self.row(vec![button])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Button {
    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(action),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_shapes_rows() {
        let kb = Keyboard::new()
            .row(vec![
                Button::callback("Yes", CallbackAction::Submit),
                Button::callback("No", CallbackAction::CancelDraft),
            ])
            .single(Button::url("Open", "https://example.com"));
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[0].len(), 2);
        assert_eq!(kb.rows[1].len(), 1);
        assert!(!kb.is_empty());
        assert!(Keyboard::new().is_empty());
    }
}
