//! One-shot background computation
//!
//! Used to overlap two independent probes, e.g. building the package index
//! while scanning process mappings, and joining before correlation.

use crate::panic_message;
use crossbeam::channel::{bounded, Receiver};
use pkgcruft_errors::{Error, ResourceError};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Handle to a value being computed on its own thread
pub struct BackgroundTask<T> {
    name: String,
    receiver: Receiver<Result<T, Error>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Start `work` on a new named thread
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(name: impl Into<String>, work: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        let name = name.into();
        let (sender, receiver) = bounded(1);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // The waiter may have gone away; nothing to report then
                let _ = sender.send(work());
            })
            .map_err(|e| ResourceError::SpawnFailed {
                message: e.to_string(),
            })?;

        debug!(task = %name, "background task started");
        Ok(Self {
            name,
            receiver,
            handle: Some(handle),
        })
    }

    /// Block until the task has produced its value
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or a resource error if the task
    /// panicked before producing a value.
    pub fn wait(mut self) -> Result<T, Error> {
        let received = self.receiver.recv();
        let joined = self.handle.take().map(JoinHandle::join);
        debug!(task = %self.name, "background task joined");

        match (received, joined) {
            (Ok(result), _) => result,
            (Err(_), Some(Err(payload))) => Err(ResourceError::WorkerPanicked {
                message: panic_message(payload.as_ref()),
            }
            .into()),
            (Err(_), _) => Err(ResourceError::TaskAbandoned {
                name: self.name.clone(),
            }
            .into()),
        }
    }
}
