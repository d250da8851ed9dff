//! Main CruftGuard implementation

use crate::checkrestart::stale_processes;
use crate::defunct::defunct_packages;
use crate::libcheck::{library_cruft, LibraryContext};
use crate::orphan::{empty_directories, unmanaged_files};
use crate::types::{Finding, FindingSink};
use pkgcruft_config::Config;
use pkgcruft_errors::Error;
use pkgcruft_index::PackageIndex;
use pkgcruft_platform::{LinkerInspector, PackageManager, ProcessInspector, ProcessIntrospector};
use pkgcruft_resolver::LibraryResolver;
use pkgcruft_resources::BackgroundTask;
use pkgcruft_types::PackageId;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs the cruft checks against one system
pub struct CruftGuard {
    config: Config,
    packages: Arc<dyn PackageManager>,
    linker: Arc<dyn LinkerInspector>,
    processes: Arc<dyn ProcessIntrospector>,
}

impl CruftGuard {
    pub(crate) fn new(
        config: Config,
        packages: Arc<dyn PackageManager>,
        linker: Arc<dyn LinkerInspector>,
        processes: Arc<dyn ProcessIntrospector>,
    ) -> Self {
        Self {
            config,
            packages,
            linker,
            processes,
        }
    }

    /// Create a builder for configuring the guard
    #[must_use]
    pub fn builder() -> crate::core::CruftGuardBuilder {
        crate::core::CruftGuardBuilder::new()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Installed packages missing from every repository
    ///
    /// # Errors
    ///
    /// Returns an error if either package listing fails.
    pub fn defunct(&self, sink: &mut FindingSink<'_>) -> Result<(), Error> {
        for id in self.defunct_set()? {
            sink(Finding::DefunctPackage(id))?;
        }
        Ok(())
    }

    /// Files under the prefix no package owns
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be built.
    pub fn files(&self, sink: &mut FindingSink<'_>) -> Result<(), Error> {
        let ignore = self.config.ignore_unpackaged_set()?;
        let index = self.build_index()?;
        unmanaged_files(&self.config.prefix, &index, &ignore, sink)
    }

    /// Directories under the prefix holding no packaged file
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be built.
    pub fn dirs(&self, sink: &mut FindingSink<'_>) -> Result<(), Error> {
        let ignore = self.config.ignore_unpackaged_set()?;
        let index = self.build_index()?;
        empty_directories(&self.config.prefix, &index, &ignore, sink)
    }

    /// Packaged binaries with problematic library dependencies
    ///
    /// The defunct set is computed in the background while the index is
    /// built.
    ///
    /// # Errors
    ///
    /// Returns an error if a package query or a linker batch fails.
    pub fn libcheck(&self, sink: &mut FindingSink<'_>) -> Result<(), Error> {
        let resolver = LibraryResolver::new(Arc::clone(&self.linker), &self.config)?;

        let packages = Arc::clone(&self.packages);
        let defunct = BackgroundTask::spawn("defunct-packages", move || {
            let local = packages.local_packages()?;
            let remote = packages.remote_packages()?;
            Ok(defunct_packages(&local, &remote))
        })?;

        let index = self.build_index()?;
        let defunct = defunct.wait()?;
        debug!(defunct = defunct.len(), "defunct packages computed");

        let ctx = LibraryContext::new(&index, defunct, &self.config.prefix)?;
        library_cruft(&ctx, &resolver, sink)
    }

    /// Processes running deleted or replaced code
    ///
    /// # Errors
    ///
    /// Returns an error if the process table or the index cannot be read.
    pub fn checkrestart(&self, sink: &mut FindingSink<'_>) -> Result<(), Error> {
        let inspector = ProcessInspector::new(Arc::clone(&self.processes))?;
        stale_processes(&self.packages, &inspector, sink)
    }

    fn defunct_set(&self) -> Result<Vec<PackageId>, Error> {
        let local = self.packages.local_packages()?;
        let remote = self.packages.remote_packages()?;
        let defunct = defunct_packages(&local, &remote);
        debug!(
            local = local.len(),
            remote = remote.len(),
            defunct = defunct.len(),
            "defunct packages computed"
        );
        Ok(defunct)
    }

    fn build_index(&self) -> Result<PackageIndex, Error> {
        let start = Instant::now();
        let index = PackageIndex::build(Arc::clone(&self.packages))?;
        debug!(
            packages = index.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "package index ready"
        );
        Ok(index)
    }
}
