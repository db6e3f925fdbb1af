//! Structured health reporting for runtime lifecycle events.

use std::sync::Arc;

use exposer_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatcher::DispatchError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a dispatcher spawns its workers.
    fn dispatcher_starting(&self, name: &str, threads: usize);

    /// Invoked once every worker of a dispatcher runs.
    fn dispatcher_started(&self, name: &str, threads: usize);

    /// Invoked after every worker of a dispatcher has exited.
    fn dispatcher_stopped(&self, name: &str);

    /// Invoked when a worker terminates abnormally.
    fn worker_failed(&self, error: &DispatchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn dispatcher_starting(&self, name: &str, threads: usize) {
        (**self).dispatcher_starting(name, threads);
    }

    fn dispatcher_started(&self, name: &str, threads: usize) {
        (**self).dispatcher_started(name, threads);
    }

    fn dispatcher_stopped(&self, name: &str) {
        (**self).dispatcher_stopped(name);
    }

    fn worker_failed(&self, error: &DispatchError) {
        (**self).worker_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting runtime bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            web_port = config.web_port,
            web_threads = config.web_threads,
            command_line = config.command_line,
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "runtime bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "runtime bootstrap failed"
        );
    }

    fn dispatcher_starting(&self, name: &str, threads: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "dispatcher_starting",
            dispatcher = name,
            threads,
            "starting dispatcher"
        );
    }

    fn dispatcher_started(&self, name: &str, threads: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "dispatcher_started",
            dispatcher = name,
            threads,
            "dispatcher running"
        );
    }

    fn dispatcher_stopped(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "dispatcher_stopped",
            dispatcher = name,
            "dispatcher stopped"
        );
    }

    fn worker_failed(&self, error: &DispatchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "worker_failed",
            error = %error,
            "dispatcher worker failed"
        );
    }
}
