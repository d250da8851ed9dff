//! Fixed defaults and probe tuning
//!
//! Only the values in the first block are user-configurable; the batch
//! sizes are tuned to keep each external command line short.

pub const DEFAULT_PREFIX: &str = "/usr/local";
pub const DEFAULT_CONCURRENCY: usize = 16;
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 32;

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "PKGCRUFT_CONFIG";

/// Package identifiers per `pkg query` invocation
pub const PKG_QUERY_BATCH: usize = 32;
/// Concurrent `pkg query` invocations while building the index
pub const PKG_QUERY_CONCURRENCY: usize = 4;

/// Paths per `ldd` invocation
pub const LDD_BATCH: usize = 32;

/// Pids per `procstat -b` invocation
pub const PROCSTAT_BATCH: usize = 16;
/// Concurrent identity probes during a process scan
pub const PROCSTAT_CONCURRENCY: usize = 4;
