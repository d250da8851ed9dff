//! CLI error handling

use std::fmt;

use pkgcruft_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration or check failure
    Run(pkgcruft_errors::Error),
    /// Writing findings failed
    Io(std::io::Error),
    /// The check thread died without reporting
    Aborted(String),
}

impl CliError {
    /// Whether stdout was closed by the reader (e.g. `pkgcruft files | head`)
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            CliError::Run(e) => e.is_broken_pipe(),
            CliError::Io(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
            CliError::Aborted(_) => false,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Run(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Aborted(msg) => write!(f, "check aborted: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Run(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Aborted(_) => None,
        }
    }
}

impl From<pkgcruft_errors::Error> for CliError {
    fn from(e: pkgcruft_errors::Error) -> Self {
        CliError::Run(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcruft_errors::{ConfigError, Error};

    #[test]
    fn test_broken_pipe_is_recognised() {
        let io = std::io::Error::from(std::io::ErrorKind::BrokenPipe);
        assert!(CliError::Run(Error::from(io)).is_broken_pipe());
        assert!(CliError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).is_broken_pipe());
        assert!(!CliError::Aborted("panic".to_string()).is_broken_pipe());
    }

    #[test]
    fn test_display_includes_code() {
        let err = CliError::from(Error::from(ConfigError::InvalidValue {
            field: "CONCURRENCY".to_string(),
            value: "64".to_string(),
        }));
        let rendered = err.to_string();
        assert!(rendered.contains("CONCURRENCY"));
        assert!(rendered.contains("Code: "));
    }
}
