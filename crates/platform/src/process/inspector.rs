//! Processes running code from anonymous executable memory
//!
//! A process whose executable or a library it loaded was replaced on disk
//! keeps the old text mapped without a backing path. Those pids are
//! collected from the mapping table, then identified in small batches.

use pkgcruft_config::constants::{PROCSTAT_BATCH, PROCSTAT_CONCURRENCY};
use pkgcruft_errors::Error;
use pkgcruft_resources::{batched, WorkerPool};
use pkgcruft_types::{ProcessIdentity, ProcessRecord};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use super::ProcessIntrospector;

/// Name reported when not even `ps` knows the process
const UNKNOWN_NAME: &str = "?";

/// Finds and identifies processes with anonymous executable mappings
pub struct ProcessInspector {
    introspector: Arc<dyn ProcessIntrospector>,
    pool: WorkerPool,
}

impl ProcessInspector {
    /// # Errors
    ///
    /// Returns an error if the identification pool cannot be configured.
    pub fn new(introspector: Arc<dyn ProcessIntrospector>) -> Result<Self, Error> {
        Ok(Self {
            introspector,
            pool: WorkerPool::new(PROCSTAT_CONCURRENCY)?.named("procstat"),
        })
    }

    /// One record per distinct pid with an anonymous executable mapping,
    /// sorted by pid
    ///
    /// Identification is best-effort: a pid the identity tool cannot
    /// describe still yields a record, with its name taken from `ps` and
    /// no executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping table cannot be read.
    pub fn anonymous_executable_mappings(&self) -> Result<Vec<ProcessRecord>, Error> {
        let pids: BTreeSet<u32> = self
            .introspector
            .vm_mappings()?
            .iter()
            .filter(|mapping| mapping.is_anonymous_executable())
            .map(|mapping| mapping.pid)
            .collect();

        debug!(processes = pids.len(), "processes with anonymous executable mappings");
        if pids.is_empty() {
            return Ok(Vec::new());
        }

        let introspector = Arc::clone(&self.introspector);
        let mut records: Vec<ProcessRecord> = self
            .pool
            .map(batched(pids, PROCSTAT_BATCH), move |batch| {
                Ok(identify(introspector.as_ref(), &batch))
            })?
            .collect_all()?
            .into_iter()
            .flatten()
            .collect();

        records.sort_by_key(|record| record.pid);
        Ok(records)
    }
}

fn identify(introspector: &dyn ProcessIntrospector, pids: &[u32]) -> Vec<ProcessRecord> {
    let mut by_pid: HashMap<u32, ProcessIdentity> = match introspector.identities(pids) {
        Ok(identities) => identities.into_iter().map(|id| (id.pid, id)).collect(),
        Err(e) => {
            warn!(error = %e, pids = ?pids, "process identification failed");
            HashMap::new()
        }
    };

    pids.iter()
        .map(|&pid| match by_pid.remove(&pid) {
            Some(identity) => record_from(identity),
            None => fallback_record(introspector, pid),
        })
        .collect()
}

fn record_from(identity: ProcessIdentity) -> ProcessRecord {
    let mut record = ProcessRecord::from(identity);
    // The kernel may still report the path of a deleted binary
    record.executable = record
        .executable
        .filter(|path| path.symlink_metadata().is_ok());
    if let Some(osrel) = &record.osrel {
        debug!(pid = record.pid, osrel = %osrel, "process identified");
    }
    record
}

fn fallback_record(introspector: &dyn ProcessIntrospector, pid: u32) -> ProcessRecord {
    let name = introspector
        .process_name(pid)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    warn!(pid, name = %name, "process identified by name only");
    ProcessRecord {
        pid,
        executable: None,
        name,
        osrel: None,
    }
}
