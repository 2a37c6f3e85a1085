// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Opsdesk support bot.

use thiserror::Error;

use crate::types::TicketStatus;

/// The primary error type used across storage, routing, and flow operations.
///
/// The domain variants (`NotBound` through `ValidationFailed`) are recovered
/// locally and rendered to the originating user as templated messages; the
/// ambient variants bubble up to the caller.
#[derive(Debug, Error)]
pub enum SupportError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (send failure, malformed identifiers).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user has no current project binding.
    #[error("user has no project binding")]
    NotBound,

    /// A ticket/project/client lookup missed.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Claim race loser: the ticket is already assigned to another operator.
    #[error("ticket #{number} is already in progress")]
    AlreadyTaken { number: i64 },

    /// Attempted status transition is not legal for the current state.
    #[error("illegal ticket transition {from} -> {to}")]
    IllegalTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// The client's support thread could not be created or written to.
    #[error("support thread unavailable: {0}")]
    ThreadUnavailable(String),

    /// Required free-text input was empty or invalid.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SupportError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SupportError::Storage {
            source: Box::new(source),
        }
    }

    /// Wrap an arbitrary error as a gateway failure with context.
    pub fn gateway<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SupportError::Gateway {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
