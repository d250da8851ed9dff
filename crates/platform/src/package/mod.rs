//! Package manager queries

use pkgcruft_errors::Error;
use pkgcruft_types::PackageId;
use std::path::{Path, PathBuf};

/// Read-only access to the package database
pub trait PackageManager: Send + Sync {
    /// Every locally installed package
    ///
    /// # Errors
    ///
    /// Returns an error if the package database cannot be queried.
    fn local_packages(&self) -> Result<Vec<PackageId>, Error>;

    /// Every package available from the configured repositories
    ///
    /// # Errors
    ///
    /// Returns an error if the repository catalogue cannot be queried.
    fn remote_packages(&self) -> Result<Vec<PackageId>, Error>;

    /// `(package, file)` pairs for a batch of installed packages
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or its output cannot be parsed.
    fn package_files(&self, packages: &[PackageId]) -> Result<Vec<(PackageId, PathBuf)>, Error>;

    /// The installed package that owns `path`, if any
    ///
    /// Best-effort: lookup failures are reported as no owner.
    fn owner_of(&self, path: &Path) -> Option<PackageId>;
}
