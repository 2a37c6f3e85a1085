// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./opsdesk.toml` > `~/.config/opsdesk/opsdesk.toml`
//! > `/etc/opsdesk/opsdesk.toml` with environment variable overrides via
//! the `OPSDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OpsdeskConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/opsdesk/opsdesk.toml` (system-wide)
/// 3. `~/.config/opsdesk/opsdesk.toml` (user XDG config)
/// 4. `./opsdesk.toml` (local directory)
/// 5. `OPSDESK_*` environment variables
pub fn load_config() -> Result<OpsdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::file("/etc/opsdesk/opsdesk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("opsdesk/opsdesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("opsdesk.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<OpsdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OpsdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OpsdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `OPSDESK_TELEGRAM_BOT_TOKEN` must map
/// to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("OPSDESK_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("hours_", "hours.", 1)
            .replacen("log_", "log.", 1)
            .replacen("health_", "health.", 1)
            .replacen("session_", "session.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.log.level, "info");
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn partial_config_merges_over_defaults() {
        let config = load_config_from_str(
            r#"
[telegram]
bot_token = "123:abc"
"#,
        )
        .unwrap();
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
        // Untouched sections keep their defaults.
        assert!(config.storage.wal_mode);
        assert_eq!(config.hours.start, 10);
    }

    #[test]
    fn unknown_section_fails_extraction() {
        assert!(load_config_from_str("[webhooks]\nurl = \"x\"\n").is_err());
    }
}
