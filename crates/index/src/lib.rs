#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installed package index for pkgcruft
//!
//! This crate holds the package → files inventory of the local package
//! database and its inversion, the file → package index. It is built once
//! per run and shared read-only between worker threads.

use pkgcruft_config::constants::{PKG_QUERY_BATCH, PKG_QUERY_CONCURRENCY};
use pkgcruft_errors::Error;
use pkgcruft_platform::PackageManager;
use pkgcruft_resources::{batched, WorkerPool};
use pkgcruft_types::PackageId;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Read-only view of which installed package owns which file
#[derive(Debug, Default)]
pub struct PackageIndex {
    packages: BTreeMap<PackageId, Vec<PathBuf>>,
    files: HashMap<PathBuf, PackageId>,
    basenames: OnceLock<HashMap<String, Vec<PackageId>>>,
}

impl PackageIndex {
    /// Query the package manager for every installed package and its files
    ///
    /// File listings are fetched in batches of identifiers, a few batches
    /// at a time.
    ///
    /// # Errors
    ///
    /// Returns the first package-manager failure; nothing is retried.
    pub fn build(manager: Arc<dyn PackageManager>) -> Result<Self, Error> {
        let local = manager.local_packages()?;
        debug!(packages = local.len(), "building package index");

        let mut inventory: BTreeMap<PackageId, Vec<PathBuf>> = local
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        let pool = WorkerPool::new(PKG_QUERY_CONCURRENCY)?.named("pkg-query");
        let results = pool.map(batched(local, PKG_QUERY_BATCH), move |ids| {
            manager.package_files(&ids)
        })?;

        for listing in results {
            for (id, path) in listing? {
                inventory.entry(id).or_default().push(path);
            }
        }

        let index = Self::from_packages(inventory);
        debug!(
            packages = index.len(),
            files = index.file_count(),
            "package index built"
        );
        Ok(index)
    }

    /// Construct from an in-memory inventory
    ///
    /// A package listed more than once has its files concatenated. A file
    /// claimed by two packages is attributed to the later one in identifier
    /// order.
    pub fn from_packages<I>(inventory: I) -> Self
    where
        I: IntoIterator<Item = (PackageId, Vec<PathBuf>)>,
    {
        let mut packages: BTreeMap<PackageId, Vec<PathBuf>> = BTreeMap::new();
        for (id, files) in inventory {
            packages.entry(id).or_default().extend(files);
        }

        let mut files = HashMap::with_capacity(packages.values().map(Vec::len).sum());
        for (id, paths) in &packages {
            for path in paths {
                if let Some(previous) = files.insert(path.clone(), id.clone()) {
                    debug!(
                        path = %path.display(),
                        previous = %previous,
                        owner = %id,
                        "file claimed by more than one package"
                    );
                }
            }
        }

        Self {
            packages,
            files,
            basenames: OnceLock::new(),
        }
    }

    /// The package owning `path`, if it is packaged
    pub fn package_for(&self, path: &Path) -> Option<&PackageId> {
        self.files.get(path)
    }

    /// Whether any package owns `path`
    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Files installed by `package`, in package-manager order
    pub fn files_for(&self, package: &str) -> Option<&[PathBuf]> {
        self.packages.get(package).map(Vec::as_slice)
    }

    /// Every `(package, file)` pair, grouped by package
    pub fn entries(&self) -> impl Iterator<Item = (&PackageId, &Path)> {
        self.packages
            .iter()
            .flat_map(|(id, files)| files.iter().map(move |path| (id, path.as_path())))
    }

    /// Installed package identifiers in sorted order
    pub fn packages(&self) -> impl Iterator<Item = &PackageId> {
        self.packages.keys()
    }

    /// Packages installing a file named `basename` anywhere, sorted
    ///
    /// The basename table is built on first use.
    pub fn packages_shipping(&self, basename: &str) -> &[PackageId] {
        self.basenames
            .get_or_init(|| self.build_basenames())
            .get(basename)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn build_basenames(&self) -> HashMap<String, Vec<PackageId>> {
        let mut basenames: HashMap<String, Vec<PackageId>> = HashMap::new();
        for (id, path) in self.entries() {
            let Some(name) = path.file_name() else {
                continue;
            };
            let owners = basenames
                .entry(name.to_string_lossy().into_owned())
                .or_default();
            // Entries arrive grouped by package in sorted order
            if owners.last() != Some(id) {
                owners.push(id.clone());
            }
        }
        debug!(basenames = basenames.len(), "basename index built");
        basenames
    }

    /// Number of installed packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of distinct packaged files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
