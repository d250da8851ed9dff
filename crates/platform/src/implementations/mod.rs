//! Platform-specific implementations

pub mod freebsd;
