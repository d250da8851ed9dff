//! Files under the prefix no package owns

use globset::GlobSet;
use pkgcruft_errors::Error;
use pkgcruft_index::PackageIndex;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::types::{Finding, FindingSink};

/// Report every regular file or symlink under `root` that is neither
/// packaged nor matched by `ignore`
///
/// Ignored directories are pruned, not just filtered. Entries that cannot
/// be read are warned about and skipped.
///
/// # Errors
///
/// Returns the first error raised by `sink`.
pub fn unmanaged_files(
    root: &Path,
    index: &PackageIndex,
    ignore: &GlobSet,
    sink: &mut FindingSink<'_>,
) -> Result<(), Error> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !ignore.is_match(entry.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let file_type = entry.file_type();
        if (file_type.is_file() || file_type.is_symlink()) && !index.contains_file(entry.path())
        {
            sink(Finding::UnmanagedFile(entry.into_path()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcruft_config::compile_globs;
    use pkgcruft_types::PackageId;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn collect(root: &Path, index: &PackageIndex, ignore: &GlobSet) -> Vec<PathBuf> {
        let mut found = Vec::new();
        unmanaged_files(root, index, ignore, &mut |finding| {
            if let Finding::UnmanagedFile(path) = finding {
                found.push(path);
            }
            Ok(())
        })
        .unwrap();
        found
    }

    #[test]
    fn test_reports_unpackaged_files_and_symlinks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("etc/ssl")).unwrap();
        fs::write(root.join("bin/curl"), "elf").unwrap();
        fs::write(root.join("bin/stray"), "sh").unwrap();
        fs::write(root.join("etc/ssl/cert.pem"), "pem").unwrap();
        std::os::unix::fs::symlink("curl", root.join("bin/curl-link")).unwrap();

        let index = PackageIndex::from_packages([(
            PackageId::new("curl-8.9.1"),
            vec![root.join("bin/curl")],
        )]);
        let none = compile_globs(root, &[]).unwrap();

        assert_eq!(
            collect(root, &index, &none),
            vec![
                root.join("bin/curl-link"),
                root.join("bin/stray"),
                root.join("etc/ssl/cert.pem"),
            ]
        );
    }

    #[test]
    fn test_ignored_subtrees_are_pruned() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("etc/ssl")).unwrap();
        fs::create_dir_all(root.join("share")).unwrap();
        fs::write(root.join("etc/ssl/cert.pem"), "pem").unwrap();
        fs::write(root.join("share/notes"), "x").unwrap();

        let ignore = compile_globs(root, &["etc/ssl".to_string()]).unwrap();
        let index = PackageIndex::default();

        assert_eq!(collect(root, &index, &ignore), vec![root.join("share/notes")]);
    }

    #[test]
    fn test_sink_error_stops_the_walk() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "").unwrap();
        fs::write(temp.path().join("b"), "").unwrap();

        let mut seen = 0;
        let result = unmanaged_files(
            temp.path(),
            &PackageIndex::default(),
            &compile_globs(temp.path(), &[]).unwrap(),
            &mut |_| {
                seen += 1;
                Err(Error::internal("broken pipe"))
            },
        );
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }
}
