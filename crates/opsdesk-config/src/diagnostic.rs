// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic error types for configuration loading and validation.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration problem, reported to the user at startup.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ConfigError {
    /// The TOML/env layers failed to parse or extract.
    #[error("{message}")]
    #[diagnostic(
        code(opsdesk::config::parse),
        help("check opsdesk.toml and OPSDESK_* environment variables")
    )]
    Parse { message: String },

    /// A semantic constraint failed after deserialization.
    #[error("{message}")]
    #[diagnostic(code(opsdesk::config::validation))]
    Validation { message: String },
}

/// Convert a figment extraction error into diagnostics.
///
/// Figment already aggregates per-field problems; each becomes one entry.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render all collected errors to stderr with miette's fancy formatting.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figment_errors_convert() {
        let err = crate::loader::load_config_from_str("[nope]\nx = 1\n").unwrap_err();
        let errors = figment_to_config_errors(err);
        assert!(!errors.is_empty());
        assert!(matches!(errors[0], ConfigError::Parse { .. }));
    }
}
