//! Runtime bootstrap orchestration.

use std::sync::Arc;

use exposer_config::{Config, ConfigValidationError};
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::api::Api;
use crate::dispatcher::{DispatchError, DispatcherHandle};
use crate::errors::SetupError;
use crate::factories::{WebServerBuilder, command_line_dispatcher};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Abstracts configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be produced.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds out-of-range values.
    #[error("invalid configuration: {source}")]
    Validation {
        /// The violated constraint.
        #[source]
        source: ConfigValidationError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// A dispatcher could not be started.
    #[error("failed to start dispatcher: {source}")]
    Dispatcher {
        /// Underlying setup error.
        #[source]
        source: SetupError,
    },
}

/// Dispatchers started by a successful bootstrap.
#[derive(Debug)]
pub struct Runtime {
    config: Config,
    telemetry: TelemetryHandle,
    web: DispatcherHandle,
    command_line: Option<DispatcherHandle>,
}

impl Runtime {
    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Proof that telemetry is installed.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// The web server dispatcher.
    #[must_use]
    pub const fn web(&self) -> &DispatcherHandle {
        &self.web
    }

    /// The standard input dispatcher, when enabled.
    #[must_use]
    pub const fn command_line(&self) -> Option<&DispatcherHandle> {
        self.command_line.as_ref()
    }

    /// Signals every dispatcher and waits for their workers.
    ///
    /// The command line worker may stay blocked on standard input; it is
    /// signalled but not joined.
    ///
    /// # Errors
    ///
    /// Returns the first worker panic of the web dispatcher.
    pub fn stop(self) -> Result<(), DispatchError> {
        if let Some(command_line) = &self.command_line {
            command_line.shutdown();
        }
        self.web.stop()
    }
}

/// Loads configuration, installs telemetry and starts the dispatchers.
///
/// # Errors
///
/// Returns the first failing stage; `reporter` is told about it first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    api: Arc<Api>,
) -> Result<Runtime, BootstrapError> {
    reporter.bootstrap_starting();
    match start(loader, &reporter, api) {
        Ok(runtime) => {
            reporter.bootstrap_succeeded(&runtime.config);
            Ok(runtime)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn start(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
    api: Arc<Api>,
) -> Result<Runtime, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .validate()
        .map_err(|source| BootstrapError::Validation { source })?;

    let web = WebServerBuilder::from_config(Arc::clone(&api), &config)
        .reporter(Arc::clone(reporter))
        .start()
        .map_err(|source| BootstrapError::Dispatcher { source })?;
    let command_line = if config.command_line {
        Some(
            command_line_dispatcher(api, config.command_line_access_level, Arc::clone(reporter))
                .map_err(|source| BootstrapError::Dispatcher { source })?,
        )
    } else {
        None
    };
    Ok(Runtime {
        config,
        telemetry,
        web,
        command_line,
    })
}
