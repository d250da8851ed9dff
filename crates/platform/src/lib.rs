#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction layer for pkgcruft
//!
//! Every fact pkgcruft knows about the system comes from an external
//! tool. This crate defines one trait per collaborator:
//! - [`PackageManager`]: installed and available packages, file ownership
//! - [`LinkerInspector`]: shared-object resolution of binaries
//! - [`ProcessIntrospector`]: memory mappings and identities of processes
//!
//! plus the FreeBSD implementations backed by `pkg`, `ldd`, `procstat`
//! and `ps`, and the [`ProcessInspector`] built on top of them.

pub mod binary;
pub mod implementations;
pub mod package;
pub mod process;

pub use binary::{LinkerInspector, LinkerOutput};
pub use implementations::freebsd::FreeBsdPlatform;
pub use package::PackageManager;
pub use process::{CommandOutput, PlatformCommand, ProcessInspector, ProcessIntrospector};
