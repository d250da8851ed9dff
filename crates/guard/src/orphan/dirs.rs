//! Directories with no packaged file anywhere beneath them

use globset::GlobSet;
use pkgcruft_errors::Error;
use pkgcruft_index::PackageIndex;
use std::fs;
use std::ops::Add;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::types::{Finding, FindingSink};

/// Packaged files beneath a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum References {
    Counted(u64),
    /// Could not be determined; never reported as empty
    Unknown,
}

impl References {
    pub const ZERO: Self = Self::Counted(0);

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Add for References {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Counted(a), Self::Counted(b)) => Self::Counted(a.saturating_add(b)),
            _ => Self::Unknown,
        }
    }
}

/// One directory of the traversal, children sorted by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub path: PathBuf,
    pub references: References,
    pub children: Vec<DirectoryNode>,
}

/// Build the reference-counted tree rooted at `root`
///
/// Symlinks are never followed. An unreadable directory, or one whose
/// listing fails part-way, is `Unknown` and its remaining contents are
/// abandoned. Entries matched by `ignore` are not descended and make
/// their parent `Unknown`.
pub fn build_tree(root: &Path, index: &PackageIndex, ignore: &GlobSet) -> DirectoryNode {
    let mut node = DirectoryNode {
        path: root.to_path_buf(),
        references: References::ZERO,
        children: Vec::new(),
    };

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "cannot read directory, assuming referenced");
            node.references = References::Unknown;
            return node;
        }
    };

    let mut direct = References::ZERO;
    for entry in entries {
        let entry = match entry.and_then(|entry| Ok((entry.path(), entry.file_type()?))) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "directory listing failed, assuming referenced");
                direct = References::Unknown;
                break;
            }
        };
        let (path, file_type) = entry;

        if ignore.is_match(&path) {
            direct = References::Unknown;
            continue;
        }

        if file_type.is_dir() {
            node.children.push(build_tree(&path, index, ignore));
        } else if index.contains_file(&path) {
            direct = direct + References::Counted(1);
        }
    }

    node.children.sort_by(|a, b| a.path.cmp(&b.path));
    node.references = node
        .children
        .iter()
        .fold(direct, |total, child| total + child.references);
    node
}

/// Emit every unreferenced directory, top-down
///
/// Nothing beneath a reported directory is reported again.
///
/// # Errors
///
/// Returns the first error raised by `sink`.
pub fn report_empty(node: &DirectoryNode, sink: &mut FindingSink<'_>) -> Result<(), Error> {
    if node.references.is_zero() {
        return sink(Finding::EmptyDirectory(node.path.clone()));
    }
    for child in &node.children {
        report_empty(child, sink)?;
    }
    Ok(())
}

/// Build the tree under `root` and report its empty directories
///
/// # Errors
///
/// Returns the first error raised by `sink`.
pub fn empty_directories(
    root: &Path,
    index: &PackageIndex,
    ignore: &GlobSet,
    sink: &mut FindingSink<'_>,
) -> Result<(), Error> {
    let tree = build_tree(root, index, ignore);
    report_empty(&tree, sink)
}
