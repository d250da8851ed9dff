//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("invalid glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Point PKGCRUFT_CONFIG at a readable TOML file."),
            Self::InvalidValue { field, .. } => Some(match field.as_str() {
                "CONCURRENCY" => "CONCURRENCY must be an integer between 1 and 32.",
                "PREFIX" => "PREFIX must be an absolute path.",
                _ => "Fix the configuration value and retry the command.",
            }),
            Self::ParseError { .. } => Some("Fix the configuration file syntax and retry."),
            Self::InvalidGlob { .. } => {
                Some("IGNORE_UNPACKAGED and IGNORE_LDD take colon-separated globs.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "config.not_found",
            Self::ParseError { .. } => "config.parse_error",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::InvalidGlob { .. } => "config.invalid_glob",
        })
    }
}
