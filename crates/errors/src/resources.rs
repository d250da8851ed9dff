//! Worker pool and background task errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("failed to spawn worker thread: {message}")]
    SpawnFailed { message: String },

    #[error("worker panicked: {message}")]
    WorkerPanicked { message: String },

    #[error("background task {name} ended without a result")]
    TaskAbandoned { name: String },
}
