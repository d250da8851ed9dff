//! Linker trace output parsing

use pkgcruft_types::{ExecutableDependencies, LibraryRecord};
use std::path::{Path, PathBuf};
use tracing::debug;

const NOT_FOUND: &str = "not found";

/// Parse `executable\tsoname\tpath` lines into per-executable records
///
/// A path of `not found` becomes an unresolved record; relative paths are
/// made absolute against the working directory. Lines with any other
/// number of fields are skipped.
pub fn parse_linker_output(text: &str) -> ExecutableDependencies {
    let mut deps = ExecutableDependencies::new();

    for line in text.lines().filter(|line| !line.is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        let [executable, soname, resolved] = fields.as_slice() else {
            debug!(line = %line, "skipping malformed linker line");
            continue;
        };

        let record = if resolved.trim() == NOT_FOUND {
            LibraryRecord::not_found(*soname)
        } else {
            LibraryRecord::resolved(*soname, absolute(Path::new(resolved)))
        };
        deps.push(PathBuf::from(executable), record);
    }

    deps
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }
}
