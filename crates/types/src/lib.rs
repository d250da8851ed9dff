#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pkgcruft
//!
//! This crate provides the records passed between the package index,
//! the external-tool probes and the detection algorithms.

pub mod library;
pub mod package;
pub mod process;

// Re-export commonly used types
pub use library::{ExecutableDependencies, LibraryRecord, Resolution};
pub use package::PackageId;
pub use process::{MappingKind, Protection, ProcessIdentity, ProcessRecord, VmMapping};
