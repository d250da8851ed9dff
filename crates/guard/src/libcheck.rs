//! Broken, private, compat, unpackaged and defunct library dependencies

use pkgcruft_errors::Error;
use pkgcruft_index::PackageIndex;
use pkgcruft_resolver::LibraryResolver;
use pkgcruft_types::{LibraryRecord, PackageId, Resolution};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::types::{Finding, FindingSink, LibraryFinding, LibraryIssue};

/// `*.so` or `*.so.<digits>[.<digits>…]`
const SHARED_LIBRARY_PATTERN: &str = r"\.so(\.\d+)*$";

/// Any execute bit
const EXECUTABLE_BITS: u32 = 0o111;

/// Everything rule evaluation needs, computed once per run
pub struct LibraryContext<'a> {
    index: &'a PackageIndex,
    /// Library basename → every packaged file with that name
    libraries: HashMap<String, Vec<(PackageId, PathBuf)>>,
    defunct: HashSet<PackageId>,
    prefix: PathBuf,
    pattern: Regex,
}

impl<'a> LibraryContext<'a> {
    /// # Errors
    ///
    /// Returns an error if the shared-library pattern fails to compile.
    pub fn new<I>(index: &'a PackageIndex, defunct: I, prefix: &Path) -> Result<Self, Error>
    where
        I: IntoIterator<Item = PackageId>,
    {
        let pattern = Regex::new(SHARED_LIBRARY_PATTERN)
            .map_err(|e| Error::internal(format!("invalid library pattern: {e}")))?;

        let mut libraries: HashMap<String, Vec<(PackageId, PathBuf)>> = HashMap::new();
        for (id, path) in index.entries() {
            let Some(name) = file_name(path) else {
                continue;
            };
            if pattern.is_match(&name) {
                libraries
                    .entry(name)
                    .or_default()
                    .push((id.clone(), path.to_path_buf()));
            }
        }
        debug!(libraries = libraries.len(), "library table built");

        Ok(Self {
            index,
            libraries,
            defunct: defunct.into_iter().collect(),
            prefix: prefix.to_path_buf(),
            pattern,
        })
    }

    /// Whether a file name looks like a shared library
    pub fn is_shared_library(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Packages shipping a library named `soname`, sorted and distinct
    pub fn shipping(&self, soname: &str) -> Vec<PackageId> {
        let mut owners: Vec<PackageId> = self
            .libraries
            .get(soname)
            .into_iter()
            .flatten()
            .map(|(id, _)| id.clone())
            .collect();
        owners.sort();
        owners.dedup();
        owners
    }

    /// Packaged regular files worth tracing: anything executable, plus
    /// shared libraries
    pub fn executables(&self) -> Vec<PathBuf> {
        self.index
            .entries()
            .filter(|(_, path)| self.is_traceable(path))
            .map(|(_, path)| path.to_path_buf())
            .collect()
    }

    fn is_traceable(&self, path: &Path) -> bool {
        let metadata = match path.symlink_metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "packaged file not readable");
                return false;
            }
        };
        if !metadata.is_file() {
            return false;
        }
        metadata.permissions().mode() & EXECUTABLE_BITS != 0
            || file_name(path).is_some_and(|name| self.is_shared_library(&name))
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn in_compat_tree(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::Normal(name) if name == "compat"))
}

/// Apply the library rules, in priority order, to one dependency of
/// `executable`, which `owner` installed
///
/// 1. Unresolved: a miss, unless some package ships the soname. If the
///    executable's own package is among those it is assumed to know
///    where to find it; otherwise the library is private to the others.
/// 2. Resolved into a `compat` tree owned by a different package.
/// 3. Resolved under the prefix to a file no package owns.
/// 4. Resolved into a defunct package.
pub fn classify_dependency(
    ctx: &LibraryContext<'_>,
    executable: &Path,
    owner: &PackageId,
    record: &LibraryRecord,
) -> Option<LibraryFinding> {
    let issue = match &record.resolution {
        Resolution::NotFound => {
            let candidates = ctx.shipping(&record.soname);
            if candidates.is_empty() {
                LibraryIssue::Missing {
                    soname: record.soname.clone(),
                }
            } else if candidates.contains(owner) {
                return None;
            } else {
                LibraryIssue::Private {
                    soname: record.soname.clone(),
                    candidates,
                }
            }
        }
        Resolution::Resolved(library) => {
            let library_owner = ctx.index.package_for(library);
            match library_owner {
                Some(lib_owner) if in_compat_tree(library) && lib_owner != owner => {
                    LibraryIssue::Compat {
                        owner: lib_owner.clone(),
                        library: library.clone(),
                    }
                }
                None if library.starts_with(&ctx.prefix) => LibraryIssue::Unpackaged {
                    library: library.clone(),
                },
                Some(lib_owner) if ctx.defunct.contains(lib_owner) => LibraryIssue::Defunct {
                    owner: lib_owner.clone(),
                    library: library.clone(),
                },
                _ => return None,
            }
        }
    };

    Some(LibraryFinding {
        package: owner.clone(),
        executable: executable.to_path_buf(),
        issue,
    })
}

/// Trace every packaged executable and report problematic dependencies
///
/// # Errors
///
/// Returns the first tracing failure or `sink` error.
pub fn library_cruft(
    ctx: &LibraryContext<'_>,
    resolver: &LibraryResolver,
    sink: &mut FindingSink<'_>,
) -> Result<(), Error> {
    let executables = ctx.executables();
    debug!(executables = executables.len(), "tracing packaged executables");

    for batch in resolver.resolve(executables)? {
        let mut batch: Vec<(PathBuf, Vec<LibraryRecord>)> = batch?.into_iter().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));

        for (executable, records) in batch {
            let Some(owner) = ctx.index.package_for(&executable) else {
                debug!(path = %executable.display(), "traced file is not packaged");
                continue;
            };
            for record in &records {
                if let Some(finding) = classify_dependency(ctx, &executable, owner, record) {
                    sink(Finding::Library(finding))?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PackageIndex {
        PackageIndex::from_packages([
            (
                PackageId::new("foo-1.0"),
                vec![
                    PathBuf::from("/usr/local/bin/foo"),
                    PathBuf::from("/usr/local/lib/foo/libfoopriv.so.2"),
                ],
            ),
            (
                PackageId::new("bar-2.0"),
                vec![PathBuf::from("/usr/local/lib/bar/libbarpriv.so.1")],
            ),
            (
                PackageId::new("compat10x-amd64-10.4"),
                vec![PathBuf::from("/usr/local/lib/compat/libssl.so.8")],
            ),
            (
                PackageId::new("oldssl-1.0.2"),
                vec![PathBuf::from("/usr/local/lib/libssl.so.10")],
            ),
            (
                PackageId::new("docs-1.0"),
                vec![PathBuf::from("/usr/local/share/doc/so.txt")],
            ),
        ])
    }

    fn classify(index: &PackageIndex, record: LibraryRecord) -> Option<LibraryIssue> {
        let ctx = LibraryContext::new(
            index,
            [PackageId::new("oldssl-1.0.2")],
            Path::new("/usr/local"),
        )
        .unwrap();
        classify_dependency(
            &ctx,
            Path::new("/usr/local/bin/foo"),
            &PackageId::new("foo-1.0"),
            &record,
        )
        .map(|finding| finding.issue)
    }

    #[test]
    fn test_missing_library() {
        let index = index();
        assert_eq!(
            classify(&index, LibraryRecord::not_found("libnone.so.1")),
            Some(LibraryIssue::Missing {
                soname: "libnone.so.1".to_string()
            })
        );
    }

    #[test]
    fn test_private_library_of_other_package() {
        let index = index();
        assert_eq!(
            classify(&index, LibraryRecord::not_found("libbarpriv.so.1")),
            Some(LibraryIssue::Private {
                soname: "libbarpriv.so.1".to_string(),
                candidates: vec![PackageId::new("bar-2.0")],
            })
        );
    }

    #[test]
    fn test_own_private_library_is_suppressed() {
        let index = index();
        assert_eq!(
            classify(&index, LibraryRecord::not_found("libfoopriv.so.2")),
            None
        );
    }

    #[test]
    fn test_compat_library_of_other_package() {
        let index = index();
        assert_eq!(
            classify(
                &index,
                LibraryRecord::resolved("libssl.so.8", "/usr/local/lib/compat/libssl.so.8")
            ),
            Some(LibraryIssue::Compat {
                owner: PackageId::new("compat10x-amd64-10.4"),
                library: PathBuf::from("/usr/local/lib/compat/libssl.so.8"),
            })
        );
    }

    #[test]
    fn test_unpackaged_library_under_prefix() {
        let index = index();
        assert_eq!(
            classify(
                &index,
                LibraryRecord::resolved("libhand.so", "/usr/local/lib/libhand.so")
            ),
            Some(LibraryIssue::Unpackaged {
                library: PathBuf::from("/usr/local/lib/libhand.so")
            })
        );
        // Base system libraries are outside the prefix
        assert_eq!(
            classify(&index, LibraryRecord::resolved("libc.so.7", "/lib/libc.so.7")),
            None
        );
    }

    #[test]
    fn test_defunct_library() {
        let index = index();
        assert_eq!(
            classify(
                &index,
                LibraryRecord::resolved("libssl.so.10", "/usr/local/lib/libssl.so.10")
            ),
            Some(LibraryIssue::Defunct {
                owner: PackageId::new("oldssl-1.0.2"),
                library: PathBuf::from("/usr/local/lib/libssl.so.10"),
            })
        );
    }

    #[test]
    fn test_library_pattern() {
        let index = index();
        let ctx = LibraryContext::new(&index, [], Path::new("/usr/local")).unwrap();
        assert!(ctx.is_shared_library("libc.so"));
        assert!(ctx.is_shared_library("libssl.so.1.1"));
        assert!(!ctx.is_shared_library("libssl.so.1a"));
        assert!(!ctx.is_shared_library("so.txt"));
        assert!(!ctx.is_shared_library("libfoo.a"));
        assert_eq!(ctx.shipping("so.txt"), Vec::<PackageId>::new());
    }

    #[test]
    fn test_compat_segment_must_be_whole() {
        assert!(in_compat_tree(Path::new("/usr/local/lib/compat/libssl.so.8")));
        assert!(!in_compat_tree(Path::new("/usr/local/lib/compatibility/libx.so")));
        assert!(!in_compat_tree(Path::new("/usr/local/lib32/libcompat.so")));
    }
}
