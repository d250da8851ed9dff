//! Processes that need a restart after an upgrade

use pkgcruft_errors::Error;
use pkgcruft_index::PackageIndex;
use pkgcruft_platform::{PackageManager, ProcessInspector};
use pkgcruft_resources::BackgroundTask;
use pkgcruft_types::ProcessRecord;
use std::sync::Arc;
use tracing::debug;

use crate::types::{Finding, FindingSink, StaleProcess};

/// Report every process running code that is no longer on disk
///
/// The package index is built on a background thread while the process
/// table is scanned on this one.
///
/// # Errors
///
/// Returns an error if the process scan or the index build fails, or if
/// `sink` does.
pub fn stale_processes(
    packages: &Arc<dyn PackageManager>,
    inspector: &ProcessInspector,
    sink: &mut FindingSink<'_>,
) -> Result<(), Error> {
    let manager = Arc::clone(packages);
    let index = BackgroundTask::spawn("package-index", move || PackageIndex::build(manager))?;

    let records = inspector.anonymous_executable_mappings()?;
    let index = index.wait()?;
    debug!(processes = records.len(), "correlating processes with packages");

    for record in records {
        sink(Finding::StaleProcess(correlate(
            &index,
            packages.as_ref(),
            record,
        )))?;
    }
    Ok(())
}

/// Attach ownership information to one flagged process
pub fn correlate(
    index: &PackageIndex,
    packages: &dyn PackageManager,
    record: ProcessRecord,
) -> StaleProcess {
    match record.executable {
        Some(executable) => {
            let owner = index
                .package_for(&executable)
                .cloned()
                .or_else(|| packages.owner_of(&executable));
            StaleProcess::Running {
                executable,
                owner,
                pid: record.pid,
                name: record.name,
            }
        }
        None => StaleProcess::MissingExecutable {
            candidates: index.packages_shipping(&record.name).to_vec(),
            pid: record.pid,
            name: record.name,
        },
    }
}
