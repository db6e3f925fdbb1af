//! Runs the runtime from bootstrap to shutdown.

use std::sync::Arc;

use tracing::info;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use crate::api::Api;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::builtins::builtin_api;
use crate::health::{HealthReporter, StructuredHealthReporter};

/// Serves the built-in operations until a termination signal arrives.
///
/// # Errors
///
/// Fails when bootstrap fails, the signal handlers cannot be installed, or a
/// worker panicked.
pub fn run_runtime() -> Result<(), LaunchError> {
    let api = builtin_api().map_err(LaunchError::Registry)?;
    run_runtime_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
        Arc::new(api),
    )
}

/// Runs the runtime with injected collaborators.
pub(crate) fn run_runtime_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
    api: Arc<Api>,
) -> Result<(), LaunchError> {
    let runtime = bootstrap_with(loader, reporter, api)?;
    info!(
        target: PROCESS_TARGET,
        web = ?runtime.web().local_addr(),
        command_line = runtime.command_line().is_some(),
        "runtime ready"
    );
    let waited = shutdown.wait();
    runtime.stop()?;
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
