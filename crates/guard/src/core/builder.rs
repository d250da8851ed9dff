//! Builder pattern for CruftGuard

use crate::core::guard::CruftGuard;
use pkgcruft_config::Config;
use pkgcruft_errors::Error;
use pkgcruft_platform::{FreeBsdPlatform, LinkerInspector, PackageManager, ProcessIntrospector};
use std::sync::Arc;

/// Builder for `CruftGuard`
pub struct CruftGuardBuilder {
    config: Config,
    packages: Option<Arc<dyn PackageManager>>,
    linker: Option<Arc<dyn LinkerInspector>>,
    processes: Option<Arc<dyn ProcessIntrospector>>,
}

impl CruftGuardBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            packages: None,
            linker: None,
            processes: None,
        }
    }

    /// Set the run configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use every collaborator of a platform
    #[must_use]
    pub fn with_platform(self, platform: &FreeBsdPlatform) -> Self {
        self.with_packages(platform.packages())
            .with_linker(platform.linker())
            .with_processes(platform.processes())
    }

    /// Set the package manager
    #[must_use]
    pub fn with_packages(mut self, packages: Arc<dyn PackageManager>) -> Self {
        self.packages = Some(packages);
        self
    }

    /// Set the linker inspector
    #[must_use]
    pub fn with_linker(mut self, linker: Arc<dyn LinkerInspector>) -> Self {
        self.linker = Some(linker);
        self
    }

    /// Set the process introspector
    #[must_use]
    pub fn with_processes(mut self, processes: Arc<dyn ProcessIntrospector>) -> Self {
        self.processes = Some(processes);
        self
    }

    /// Build the guard
    ///
    /// # Errors
    ///
    /// Returns an error if any collaborator is missing or the configuration
    /// is invalid.
    pub fn build(self) -> Result<CruftGuard, Error> {
        let packages = self
            .packages
            .ok_or_else(|| Error::internal("no package manager configured"))?;
        let linker = self
            .linker
            .ok_or_else(|| Error::internal("no linker inspector configured"))?;
        let processes = self
            .processes
            .ok_or_else(|| Error::internal("no process introspector configured"))?;

        self.config.validate()?;

        Ok(CruftGuard::new(self.config, packages, linker, processes))
    }
}

impl Default for CruftGuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
