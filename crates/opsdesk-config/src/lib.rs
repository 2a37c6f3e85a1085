// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Opsdesk support bot.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment
//! variable overrides, and diagnostic error rendering.
//!
//! # Usage
//!
//! ```no_run
//! let config = opsdesk_config::load_and_validate().expect("config errors");
//! println!("operators: {:?}", config.telegram.operators);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::OpsdeskConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid [`OpsdeskConfig`] or the list of diagnostics.
pub fn load_and_validate() -> Result<OpsdeskConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<OpsdeskConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn str_round_trip_validates() {
        let config = super::load_and_validate_str(
            r#"
[telegram]
bot_token = "123:abc"
support_channel_id = -100
operators = [42]
"#,
        )
        .unwrap();
        assert_eq!(config.telegram.operators, vec![42]);
    }

    #[test]
    fn invalid_semantics_surface_as_diagnostics() {
        let errors = super::load_and_validate_str(
            r#"
[hours]
start = 20
end = 8
"#,
        )
        .unwrap_err();
        assert!(!errors.is_empty());
    }
}
