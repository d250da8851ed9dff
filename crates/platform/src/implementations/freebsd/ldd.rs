//! `ldd(1)` backed linker inspection

use pkgcruft_errors::{Error, PlatformError};
use std::path::{Path, PathBuf};

use crate::binary::{LinkerInspector, LinkerOutput};
use crate::process::PlatformCommand;

const LDD: &str = "ldd";

/// One line per dependency: requesting object, soname, resolved path
///
/// `ldd` takes two formats, one for `lib*` dependencies and one for the
/// rest, so this is passed twice.
pub const LDD_FORMAT: &str = "%A\t%o\t%p\n";

/// FreeBSD implementation of linker inspection
#[derive(Debug, Clone)]
pub struct Ldd {
    program: String,
}

impl Ldd {
    pub fn new() -> Self {
        Self::with_program(LDD)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ldd {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkerInspector for Ldd {
    fn inspect(&self, paths: &[PathBuf]) -> Result<LinkerOutput, Error> {
        if paths.is_empty() {
            return Ok(LinkerOutput::default());
        }

        let mut cmd = PlatformCommand::new(&self.program);
        cmd.args(["-f", LDD_FORMAT, "-f", LDD_FORMAT])
            .arg("--")
            .args(paths);
        let output = cmd.output()?;

        let failures: Vec<String> = output
            .stderr_text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();

        if !output.success() {
            // Killed by a signal: nothing the output says can be trusted
            if output.status.code().is_none() {
                return Err(output.failure(&cmd));
            }
            // A failed run must say which files it failed on
            if !failures.iter().any(|line| is_per_file(line, paths)) {
                return Err(output.failure(&cmd));
            }
            if let Some(line) = failures.iter().find(|line| !is_per_file(line, paths)) {
                return Err(PlatformError::CommandFailed {
                    command: cmd.describe(),
                    status: output.status.to_string(),
                    stderr: line.clone(),
                }
                .into());
            }
        }

        Ok(LinkerOutput {
            stdout: output.stdout_text(),
            failures,
        })
    }
}

/// Whether a diagnostic names one of the files in the batch
///
/// `ldd` reports per-file problems as `ldd: <path>: <reason>`.
fn is_per_file(line: &str, paths: &[PathBuf]) -> bool {
    let Some(rest) = line.strip_prefix("ldd: ") else {
        return false;
    };
    paths.iter().any(|path| names_path(rest, path))
}

fn names_path(rest: &str, path: &Path) -> bool {
    let path = path.to_string_lossy();
    rest.strip_prefix(path.as_ref())
        .is_some_and(|tail| tail.starts_with(':'))
}
