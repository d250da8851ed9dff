//! Platform tool execution errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur while running external inspection tools
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PlatformError {
    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("command not found: {command}")]
    CommandNotFound { command: String },

    #[error("command {command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from {command}: {line}")]
    InvalidOutput { command: String, line: String },

    #[error("permission denied: {operation} - {message}")]
    PermissionDenied { operation: String, message: String },
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandNotFound { .. } => {
                Some("pkgcruft needs pkg(8), ldd(1), procstat(1) and ps(1) on PATH.")
            }
            Self::PermissionDenied { .. } => Some("Re-run as root to inspect every process."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ProcessExecutionFailed { .. } => "platform.exec_failed",
            Self::CommandNotFound { .. } => "platform.command_not_found",
            Self::CommandFailed { .. } => "platform.command_failed",
            Self::InvalidOutput { .. } => "platform.invalid_output",
            Self::PermissionDenied { .. } => "platform.permission_denied",
        })
    }
}
