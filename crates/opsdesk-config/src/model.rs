// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Opsdesk support bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Opsdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; `telegram.bot_token` and `telegram.support_channel_id` are the
/// only fields `serve` cannot run without (enforced by validation).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpsdeskConfig {
    /// Telegram gateway settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Working-hours window used for SLA messaging.
    #[serde(default)]
    pub hours: HoursConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Liveness endpoint settings.
    #[serde(default)]
    pub health: HealthConfig,

    /// Conversation session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Telegram gateway configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` only makes sense for offline commands.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat id of the operator workspace (a supergroup with topics enabled).
    #[serde(default)]
    pub support_channel_id: Option<i64>,

    /// Operator allow-list: Telegram user ids permitted to act on tickets.
    #[serde(default)]
    pub operators: Vec<i64>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("opsdesk").join("opsdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("opsdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Working-hours configuration.
///
/// The window is expressed in a fixed UTC offset rather than a named zone;
/// off-hours only changes the SLA wording, never routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HoursConfig {
    /// Start of working hours, 24h clock.
    #[serde(default = "default_hours_start")]
    pub start: u8,

    /// End of working hours, 24h clock (exclusive).
    #[serde(default = "default_hours_end")]
    pub end: u8,

    /// Working days, 1 = Monday through 7 = Sunday.
    #[serde(default = "default_work_days")]
    pub days: Vec<u8>,

    /// Offset from UTC in minutes for the working-hours clock.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            start: default_hours_start(),
            end: default_hours_end(),
            days: default_work_days(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_hours_start() -> u8 {
    10
}

fn default_hours_end() -> u8 {
    19
}

fn default_work_days() -> Vec<u8> {
    vec![1, 2, 3, 4, 5]
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Port for the HTTP liveness endpoint. 0 disables it.
    #[serde(default)]
    pub port: u16,
}

/// Conversation session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds of inactivity after which an abandoned session is dropped.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    3600
}
