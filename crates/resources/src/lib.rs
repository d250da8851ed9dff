#![deny(clippy::pedantic, unsafe_code)]

//! Resource management utilities for pkgcruft
//!
//! This crate provides the concurrency primitives every probe is built
//! on: a bounded worker pool that maps batches through an expensive
//! transform (usually an external command), and a one-shot background
//! task handle for overlapping independent work.

pub mod pool;
pub mod task;

pub use pool::{batched, Batched, PoolResults, WorkerPool};
pub use task::BackgroundTask;

/// Render a thread panic payload for error reporting
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
