// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per entity.
//!
//! Every function takes `&Database` and runs on the single writer thread
//! via `connection().call()`.

pub mod bindings;
pub mod clients;
pub mod feedback;
pub mod messages;
pub mod projects;
pub mod tickets;

use std::str::FromStr;

/// Parse a TEXT column into a strum enum, surfacing bad stored values as
/// conversion failures instead of panics.
pub(crate) fn parse_enum<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
