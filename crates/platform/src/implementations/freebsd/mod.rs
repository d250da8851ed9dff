//! FreeBSD platform implementation

pub mod ldd;
pub mod pkg;
pub mod procstat;

use std::sync::Arc;

use crate::binary::LinkerInspector;
use crate::package::PackageManager;
use crate::process::ProcessIntrospector;

pub use ldd::Ldd;
pub use pkg::Pkg;
pub use procstat::Procstat;

/// The collaborators of a FreeBSD host, shareable across threads
#[derive(Clone)]
pub struct FreeBsdPlatform {
    packages: Arc<dyn PackageManager>,
    linker: Arc<dyn LinkerInspector>,
    processes: Arc<dyn ProcessIntrospector>,
}

impl FreeBsdPlatform {
    /// Create a new FreeBSD platform instance using the base system tools
    pub fn new() -> Self {
        Self {
            packages: Arc::new(Pkg::new()),
            linker: Arc::new(Ldd::new()),
            processes: Arc::new(Procstat::new()),
        }
    }

    /// Access package queries
    pub fn packages(&self) -> Arc<dyn PackageManager> {
        Arc::clone(&self.packages)
    }

    /// Access linker inspection
    pub fn linker(&self) -> Arc<dyn LinkerInspector> {
        Arc::clone(&self.linker)
    }

    /// Access process introspection
    pub fn processes(&self) -> Arc<dyn ProcessIntrospector> {
        Arc::clone(&self.processes)
    }
}

impl Default for FreeBsdPlatform {
    fn default() -> Self {
        Self::new()
    }
}
