//! Dynamic-library dependency records

use std::collections::hash_map::{self, HashMap};
use std::path::{Path, PathBuf};

/// Outcome of the dynamic linker's search for one dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Absolute path the linker would load
    Resolved(PathBuf),
    /// The linker reported `not found`; this is never a filesystem path
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// One (executable, dependency) pair as reported by the linker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    /// Logical name requested at link time, e.g. `libssl.so.30`
    pub soname: String,
    pub resolution: Resolution,
}

impl LibraryRecord {
    pub fn resolved(soname: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            soname: soname.into(),
            resolution: Resolution::Resolved(path.into()),
        }
    }

    pub fn not_found(soname: impl Into<String>) -> Self {
        Self {
            soname: soname.into(),
            resolution: Resolution::NotFound,
        }
    }
}

/// Executable path → dependencies in linker order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutableDependencies {
    entries: HashMap<PathBuf, Vec<LibraryRecord>>,
}

impl ExecutableDependencies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency to an executable's list, preserving order
    pub fn push(&mut self, executable: PathBuf, record: LibraryRecord) {
        self.entries.entry(executable).or_default().push(record);
    }

    /// Merge another batch; batches never share executables, but if they do
    /// the later records are appended
    pub fn merge(&mut self, other: ExecutableDependencies) {
        for (executable, records) in other.entries {
            self.entries.entry(executable).or_default().extend(records);
        }
    }

    #[must_use]
    pub fn get(&self, executable: &Path) -> Option<&[LibraryRecord]> {
        self.entries.get(executable).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[LibraryRecord])> {
        self.entries
            .iter()
            .map(|(exe, records)| (exe.as_path(), records.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ExecutableDependencies {
    type Item = (PathBuf, Vec<LibraryRecord>);
    type IntoIter = hash_map::IntoIter<PathBuf, Vec<LibraryRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_linker_order() {
        let mut deps = ExecutableDependencies::new();
        let exe = PathBuf::from("/usr/local/bin/curl");
        deps.push(exe.clone(), LibraryRecord::resolved("libz.so.6", "/lib/libz.so.6"));
        deps.push(exe.clone(), LibraryRecord::not_found("libnghttp2.so.14"));

        let records = deps.get(&exe).unwrap();
        assert_eq!(records[0].soname, "libz.so.6");
        assert!(records[1].resolution.is_not_found());
        assert_eq!(records[1].resolution.path(), None);
    }

    #[test]
    fn test_merge_batches() {
        let mut first = ExecutableDependencies::new();
        first.push(
            PathBuf::from("/usr/local/bin/a"),
            LibraryRecord::not_found("liba.so.1"),
        );
        let mut second = ExecutableDependencies::new();
        second.push(
            PathBuf::from("/usr/local/bin/b"),
            LibraryRecord::not_found("libb.so.1"),
        );

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert!(first.get(Path::new("/usr/local/bin/b")).is_some());
    }
}
