//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::{Mutex, PoisonError};

use exposer_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatcher::DispatchError;
use crate::health::HealthReporter;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    DispatcherStarting { name: String, threads: usize },
    DispatcherStarted { name: String, threads: usize },
    DispatcherStopped(String),
    WorkerFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn dispatcher_starting(&self, name: &str, threads: usize) {
        self.record(HealthEvent::DispatcherStarting {
            name: name.to_owned(),
            threads,
        });
    }

    fn dispatcher_started(&self, name: &str, threads: usize) {
        self.record(HealthEvent::DispatcherStarted {
            name: name.to_owned(),
            threads,
        });
    }

    fn dispatcher_stopped(&self, name: &str) {
        self.record(HealthEvent::DispatcherStopped(name.to_owned()));
    }

    fn worker_failed(&self, error: &DispatchError) {
        self.record(HealthEvent::WorkerFailed(error.to_string()));
    }
}
