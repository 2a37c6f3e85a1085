// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every problem before reporting (does not fail fast).

use crate::diagnostic::ConfigError;
use crate::model::OpsdeskConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &OpsdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "telegram.bot_token must not be empty when set".to_string(),
        });
    }

    if config.hours.start >= 24 || config.hours.end > 24 {
        errors.push(ConfigError::Validation {
            message: format!(
                "hours.start/end must be on the 24h clock, got {}..{}",
                config.hours.start, config.hours.end
            ),
        });
    }

    if config.hours.start >= config.hours.end {
        errors.push(ConfigError::Validation {
            message: format!(
                "hours.start ({}) must be before hours.end ({})",
                config.hours.start, config.hours.end
            ),
        });
    }

    for day in &config.hours.days {
        if !(1..=7).contains(day) {
            errors.push(ConfigError::Validation {
                message: format!("hours.days entries must be 1..=7 (1 = Monday), got {day}"),
            });
        }
    }

    // A whole day in minutes on either side covers every real offset.
    if config.hours.utc_offset_minutes.abs() > 14 * 60 {
        errors.push(ConfigError::Validation {
            message: format!(
                "hours.utc_offset_minutes out of range: {}",
                config.hours.utc_offset_minutes
            ),
        });
    }

    if config.session.idle_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.idle_timeout_secs must be positive".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
