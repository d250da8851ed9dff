//! Process and virtual-memory mapping records

use std::path::PathBuf;

/// Protection bits of a mapping (`PRT` column, e.g. `r-x`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Protection {
    /// Parse a `rwx`-style flag string; unknown characters are ignored
    #[must_use]
    pub fn parse(flags: &str) -> Self {
        Self {
            read: flags.contains('r'),
            write: flags.contains('w'),
            execute: flags.contains('x'),
        }
    }
}

/// Backing object of a mapping (`TP` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    /// Backed by a filesystem node
    Vnode,
    /// Anonymous memory (`df`)
    Default,
    Swap,
    Device,
    Physical,
    Other,
}

impl MappingKind {
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "vn" => Self::Vnode,
            "df" => Self::Default,
            "sw" => Self::Swap,
            "dv" => Self::Device,
            "ph" => Self::Physical,
            _ => Self::Other,
        }
    }
}

/// One virtual-memory mapping of one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmMapping {
    pub pid: u32,
    pub protection: Protection,
    pub kind: MappingKind,
    /// Path of the backing file, if the kernel can still name it
    pub path: Option<PathBuf>,
}

impl VmMapping {
    /// Executable, vnode-backed, and without a resolvable path: the
    /// backing file was deleted while still mapped.
    #[must_use]
    pub fn is_anonymous_executable(&self) -> bool {
        self.protection.execute && self.kind == MappingKind::Vnode && self.path.is_none()
    }
}

/// What the identity probe reports for a pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
    pub executable: Option<PathBuf>,
    pub osrel: Option<String>,
}

/// A process flagged as running deleted code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Absent when the executable no longer exists on disk
    pub executable: Option<PathBuf>,
    pub name: String,
    /// OS release the binary was built for, when known
    pub osrel: Option<String>,
}

impl From<ProcessIdentity> for ProcessRecord {
    fn from(identity: ProcessIdentity) -> Self {
        Self {
            pid: identity.pid,
            executable: identity.executable,
            name: identity.name,
            osrel: identity.osrel,
        }
    }
}
