//! Errors surfaced while stopping a dispatcher.

use thiserror::Error;

/// Failures observed when joining dispatcher workers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A worker thread panicked outside request processing.
    #[error("worker '{worker}' of dispatcher '{dispatcher}' panicked")]
    WorkerPanicked {
        /// Dispatcher name.
        dispatcher: String,
        /// Thread name of the worker.
        worker: String,
    },
}

impl DispatchError {
    /// Creates a worker panic error.
    #[must_use]
    pub fn worker_panicked(dispatcher: impl Into<String>, worker: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            dispatcher: dispatcher.into(),
            worker: worker.into(),
        }
    }
}
