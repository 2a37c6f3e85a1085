// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Opsdesk support bot.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed CRUD
//! operations for clients, projects, bindings, tickets, messages, and
//! feedback. The two operations the rest of the system relies on for
//! correctness under concurrency -- ticket-number allocation and ticket
//! claim -- live in [`queries::tickets`].

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
