#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared-library resolution for pkgcruft
//!
//! This crate asks the dynamic linker which shared objects each packaged
//! binary would load. Paths are traced in batches on a worker pool and
//! every batch yields one [`ExecutableDependencies`] as soon as it is done.

mod parse;

pub use parse::parse_linker_output;

use globset::GlobSet;
use pkgcruft_config::constants::LDD_BATCH;
use pkgcruft_config::Config;
use pkgcruft_errors::Error;
use pkgcruft_platform::LinkerInspector;
use pkgcruft_resources::{batched, PoolResults, WorkerPool};
use pkgcruft_types::ExecutableDependencies;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Resolves the library dependencies of packaged binaries
pub struct LibraryResolver {
    linker: Arc<dyn LinkerInspector>,
    ignore: Arc<GlobSet>,
    pool: WorkerPool,
}

impl LibraryResolver {
    /// Create a resolver using the configured concurrency and `IGNORE_LDD`
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore globs or the concurrency are invalid.
    pub fn new(linker: Arc<dyn LinkerInspector>, config: &Config) -> Result<Self, Error> {
        Self::with_ignore(linker, config.ignore_ldd_set()?, config.concurrency)
    }

    /// Create a resolver with an explicit ignore set
    ///
    /// # Errors
    ///
    /// Returns an error if `concurrency` is outside 1–32.
    pub fn with_ignore(
        linker: Arc<dyn LinkerInspector>,
        ignore: GlobSet,
        concurrency: usize,
    ) -> Result<Self, Error> {
        Ok(Self {
            linker,
            ignore: Arc::new(ignore),
            pool: WorkerPool::new(concurrency)?.named("ldd"),
        })
    }

    /// Trace every path not matched by the ignore set
    ///
    /// Results arrive per batch in completion order. A batch whose trace
    /// failed outright is delivered as the single error of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn resolve<I>(&self, paths: I) -> Result<PoolResults<ExecutableDependencies>, Error>
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: Send + 'static,
    {
        let ignore = Arc::clone(&self.ignore);
        let candidates = paths.into_iter().filter(move |path| {
            let ignored = ignore.is_match(path);
            if ignored {
                debug!(path = %path.display(), "skipping ignored path");
            }
            !ignored
        });

        let linker = Arc::clone(&self.linker);
        self.pool
            .map(batched(candidates, LDD_BATCH), move |batch: Vec<PathBuf>| {
                let output = linker.inspect(&batch)?;
                for failure in &output.failures {
                    debug!(diagnostic = %failure, "linker could not trace file");
                }
                Ok(parse_linker_output(&output.stdout))
            })
    }
}
