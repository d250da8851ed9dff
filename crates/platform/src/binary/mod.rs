//! Dynamic-linker inspection of binaries

use pkgcruft_errors::Error;
use std::path::PathBuf;

/// Raw result of one linker-trace run over a batch of files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerOutput {
    /// Tab-separated `path\tsoname\tresolved` lines
    pub stdout: String,
    /// Diagnostics for individual files the tool could not handle
    pub failures: Vec<String>,
}

/// Lists the shared objects each file in a batch would load
pub trait LinkerInspector: Send + Sync {
    /// Trace a batch of files
    ///
    /// Per-file failures (not an ELF object, unreadable) land in
    /// [`LinkerOutput::failures`] and do not fail the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool could not be run or failed in a way
    /// that cannot be attributed to individual files.
    fn inspect(&self, paths: &[PathBuf]) -> Result<LinkerOutput, Error>;
}
