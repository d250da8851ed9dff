//! Package-manager error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("package manager query failed: {command}: {message}")]
    QueryFailed { command: String, message: String },

    #[error("unexpected package manager output from {command}: {line}")]
    InvalidOutput { command: String, line: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::QueryFailed { .. } => {
                Some("Check that the package database is readable and not locked, then retry.")
            }
            Self::InvalidOutput { .. } => {
                Some("The package manager produced output in an unexpected format.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::QueryFailed { .. } => "package.query_failed",
            Self::InvalidOutput { .. } => "package.invalid_output",
        })
    }
}
