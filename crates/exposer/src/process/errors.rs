//! Error surface of the process lifecycle.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::dispatcher::DispatchError;
use crate::errors::SetupError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or stopping the runtime.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The built-in operations could not be registered.
    #[error("failed to build the operation registry: {0}")]
    Registry(#[source] SetupError),
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Waiting for a termination signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// A worker panicked while the runtime was stopping.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
