//! `pkg(8)` backed package queries

use pkgcruft_errors::{Error, PackageError};
use pkgcruft_types::PackageId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::package::PackageManager;
use crate::process::PlatformCommand;

const PKG: &str = "pkg";
const ID_FORMAT: &str = "%n-%v";
const FILE_FORMAT: &str = "%n-%v\t%Fp";

/// FreeBSD implementation of package queries
#[derive(Debug, Clone)]
pub struct Pkg {
    program: String,
}

impl Pkg {
    pub fn new() -> Self {
        Self::with_program(PKG)
    }

    /// Use a different `pkg` binary, e.g. a wrapper for a jail
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> PlatformCommand {
        PlatformCommand::new(&self.program)
    }

    fn query(&self, cmd: &PlatformCommand) -> Result<String, Error> {
        let output = cmd.output()?;
        if !output.success() {
            return Err(PackageError::QueryFailed {
                command: cmd.describe(),
                message: format!("{}: {}", output.status, output.stderr_text()),
            }
            .into());
        }
        Ok(output.stdout_text())
    }
}

impl Default for Pkg {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for Pkg {
    fn local_packages(&self) -> Result<Vec<PackageId>, Error> {
        let mut cmd = self.command();
        cmd.args(["query", "-a", ID_FORMAT]);
        Ok(parse_package_list(&self.query(&cmd)?))
    }

    fn remote_packages(&self) -> Result<Vec<PackageId>, Error> {
        let mut cmd = self.command();
        cmd.args(["rquery", "-a", ID_FORMAT]);
        Ok(parse_package_list(&self.query(&cmd)?))
    }

    fn package_files(&self, packages: &[PackageId]) -> Result<Vec<(PackageId, PathBuf)>, Error> {
        if packages.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = self.command();
        cmd.args(["query", FILE_FORMAT]);
        cmd.args(packages.iter().map(PackageId::as_str));
        parse_file_listing(&cmd.describe(), &self.query(&cmd)?)
    }

    fn owner_of(&self, path: &Path) -> Option<PackageId> {
        let mut cmd = self.command();
        cmd.args(["which", "-q"]).arg(path);
        match cmd.output() {
            Ok(output) if output.success() => {
                let owner = output.stdout_text();
                let owner = owner.trim();
                (!owner.is_empty()).then(|| PackageId::new(owner))
            }
            Ok(_) => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ownership lookup failed");
                None
            }
        }
    }
}

/// One package identifier per non-blank line
pub fn parse_package_list(text: &str) -> Vec<PackageId> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PackageId::new)
        .collect()
}

/// Parse `name-version\tpath` lines
///
/// Identifiers are interned so every file of a package shares one
/// allocation.
///
/// # Errors
///
/// Returns an error for a non-blank line without a tab separator.
pub fn parse_file_listing(command: &str, text: &str) -> Result<Vec<(PackageId, PathBuf)>, Error> {
    let mut interned: HashMap<&str, PackageId> = HashMap::new();
    let mut files = Vec::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let Some((id, path)) = line.split_once('\t') else {
            return Err(PackageError::InvalidOutput {
                command: command.to_string(),
                line: line.to_string(),
            }
            .into());
        };
        let id = interned
            .entry(id)
            .or_insert_with(|| PackageId::new(id))
            .clone();
        files.push((id, PathBuf::from(path)));
    }

    Ok(files)
}
