//! Process execution and process-table introspection

pub mod inspector;

use pkgcruft_errors::{Error, PlatformError};
use pkgcruft_types::{ProcessIdentity, VmMapping};
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;
use tracing::debug;

pub use inspector::ProcessInspector;

/// Platform-specific command builder and execution
#[derive(Debug, Clone)]
pub struct PlatformCommand {
    program: String,
    args: Vec<OsString>,
}

impl PlatformCommand {
    /// Create a new platform command
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Get the program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Short human-readable form used in logs and error messages
    ///
    /// Long argument lists (a batch of file paths) are abbreviated.
    pub fn describe(&self) -> String {
        const SHOWN: usize = 4;
        let mut rendered = self.program.clone();
        for arg in self.args.iter().take(SHOWN) {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        if self.args.len() > SHOWN {
            rendered.push_str(&format!(" ... (+{} args)", self.args.len() - SHOWN));
        }
        rendered
    }

    /// Run the command to completion, capturing both output streams
    ///
    /// A non-zero exit status is not an error here; callers decide what
    /// failure means for their tool.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    pub fn output(&self) -> Result<CommandOutput, Error> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(self, &e))?;

        debug!(
            command = %self.describe(),
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "command finished"
        );

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn spawn_error(cmd: &PlatformCommand, err: &std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound => PlatformError::CommandNotFound {
            command: cmd.program().to_string(),
        },
        ErrorKind::PermissionDenied => PlatformError::PermissionDenied {
            operation: cmd.describe(),
            message: err.to_string(),
        },
        _ => PlatformError::ProcessExecutionFailed {
            command: cmd.describe(),
            message: err.to_string(),
        },
    }
    .into()
}

/// Output from command execution
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output, lossily decoded
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error, lossily decoded and trimmed
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Convert a non-zero exit into a [`PlatformError::CommandFailed`]
    ///
    /// # Errors
    ///
    /// Returns an error if the command did not exit successfully.
    pub fn check(self, cmd: &PlatformCommand) -> Result<Self, Error> {
        if self.success() {
            Ok(self)
        } else {
            Err(self.failure(cmd))
        }
    }

    /// Describe this output as a failed run of `cmd`
    pub fn failure(&self, cmd: &PlatformCommand) -> Error {
        PlatformError::CommandFailed {
            command: cmd.describe(),
            status: self.status.to_string(),
            stderr: self.stderr_text(),
        }
        .into()
    }
}

/// Read access to the live process table
///
/// Implementations are shared across worker threads.
pub trait ProcessIntrospector: Send + Sync {
    /// Every virtual-memory mapping of every visible process
    ///
    /// # Errors
    ///
    /// Returns an error if the process table cannot be read at all.
    fn vm_mappings(&self) -> Result<Vec<VmMapping>, Error>;

    /// Identity records for a batch of pids
    ///
    /// Pids that have exited are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails for the whole batch.
    fn identities(&self, pids: &[u32]) -> Result<Vec<ProcessIdentity>, Error>;

    /// Best-effort command name of a single process
    fn process_name(&self, pid: u32) -> Option<String>;
}
