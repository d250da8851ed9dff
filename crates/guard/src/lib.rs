#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cruft detection for pkgcruft
//!
//! Each check correlates the package database with one view of the live
//! system and streams [`Finding`]s into a caller-supplied sink:
//! - defunct packages (installed, but in no repository)
//! - unpackaged files and empty directories under the prefix
//! - binaries with missing, private, compat, unpackaged or defunct
//!   library dependencies
//! - processes still running replaced or deleted code

mod checkrestart;
mod core;
mod defunct;
mod libcheck;
mod orphan;
mod types;

pub use checkrestart::{correlate, stale_processes};
pub use crate::core::{CruftGuard, CruftGuardBuilder};
pub use defunct::defunct_packages;
pub use libcheck::{classify_dependency, library_cruft, LibraryContext};
pub use orphan::{
    build_tree, empty_directories, report_empty, unmanaged_files, DirectoryNode, References,
};
pub use types::{Finding, FindingSink, LibraryFinding, LibraryIssue, StaleProcess};
