//! Type definitions for cruft findings

use pkgcruft_errors::Error;
use pkgcruft_types::PackageId;
use std::fmt;
use std::path::PathBuf;

/// Receives findings as they are produced
///
/// Returning an error (e.g. a closed output pipe) stops the scan.
pub type FindingSink<'a> = dyn FnMut(Finding) -> Result<(), Error> + 'a;

/// One instance of cruft; its `Display` is the reported line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Installed package no repository offers any more
    DefunctPackage(PackageId),
    /// File under the prefix no package owns
    UnmanagedFile(PathBuf),
    /// Directory with no packaged file anywhere beneath it
    EmptyDirectory(PathBuf),
    Library(LibraryFinding),
    StaleProcess(StaleProcess),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefunctPackage(id) => write!(f, "{id}"),
            Self::UnmanagedFile(path) | Self::EmptyDirectory(path) => {
                write!(f, "{}", path.display())
            }
            Self::Library(finding) => fmt::Display::fmt(finding, f),
            Self::StaleProcess(process) => fmt::Display::fmt(process, f),
        }
    }
}

/// A problematic dependency of one packaged binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFinding {
    /// Package owning the binary
    pub package: PackageId,
    pub executable: PathBuf,
    pub issue: LibraryIssue,
}

/// What is wrong with a dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryIssue {
    /// Nothing installed provides the soname
    Missing { soname: String },
    /// Only other packages ship a file of that name, outside the search path
    Private {
        soname: String,
        candidates: Vec<PackageId>,
    },
    /// Resolved into another package's compat tree
    Compat { owner: PackageId, library: PathBuf },
    /// Resolved to a file under the prefix no package owns
    Unpackaged { library: PathBuf },
    /// Resolved into a package no repository offers any more
    Defunct { owner: PackageId, library: PathBuf },
}

impl fmt::Display for LibraryFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ", self.package, self.executable.display())?;
        match &self.issue {
            LibraryIssue::Missing { soname } => write!(f, "missing library {soname}"),
            LibraryIssue::Private { soname, candidates } => write!(
                f,
                "missing library {soname}, private to {}?",
                join(candidates)
            ),
            LibraryIssue::Compat { owner, library } => {
                write!(f, "using {owner} compat library {}", library.display())
            }
            LibraryIssue::Unpackaged { library } => {
                write!(f, "using unpackaged library {}", library.display())
            }
            LibraryIssue::Defunct { owner, library } => {
                write!(f, "using defunct {owner} library {}", library.display())
            }
        }
    }
}

/// A process still running code that was replaced or removed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleProcess {
    /// The executable still exists; `owner` is `None` when unpackaged
    Running {
        executable: PathBuf,
        owner: Option<PackageId>,
        pid: u32,
        name: String,
    },
    /// The executable is gone; `candidates` ship a file named like the process
    MissingExecutable {
        candidates: Vec<PackageId>,
        pid: u32,
        name: String,
    },
}

impl fmt::Display for StaleProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running {
                executable,
                owner,
                pid,
                name,
            } => {
                let owner = owner.as_ref().map_or("unpackaged", PackageId::as_str);
                write!(
                    f,
                    "{} ({owner}) running as {pid} ({name})",
                    executable.display()
                )
            }
            Self::MissingExecutable {
                candidates,
                pid,
                name,
            } => {
                let guess = if candidates.is_empty() {
                    "unknown package".to_string()
                } else {
                    join(candidates)
                };
                write!(f, "[MISSING EXECUTABLE] ({guess})? running as {pid} ({name})")
            }
        }
    }
}

fn join(ids: &[PackageId]) -> String {
    ids.iter()
        .map(PackageId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
