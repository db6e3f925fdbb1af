//! Request dispatch runtime.
//!
//! Application code declares operations through [`Exposable`] and registers
//! them in an [`Api`]. A [`Dispatcher`] then serves that registry over a
//! [`Channel`]: each worker thread reads a raw request, a [`Parser`] turns it
//! into an operation call, the registry checks arity and access level and
//! converts the arguments, and a [`Wrapper`] renders the outcome in the
//! channel's format before it is written back.
//!
//! Channels cover raw HTTP ([`WebChannel`]), timers
//! ([`ScheduledTaskChannel`]), standard input ([`CommandLineChannel`]) and
//! message queues ([`QueueChannel`]). The [`factories`] module wires the
//! usual combinations, and [`bootstrap_with`] starts them from a loaded
//! [`exposer_config::Config`].
//!
//! Diagnostic output goes through `tracing`; per-request records go to the
//! [`dispatcher::logging::Logger`]s attached to each dispatcher.

pub mod api;
mod bootstrap;
mod builtins;
pub mod channel;
mod context;
pub mod dispatcher;
mod errors;
pub mod factories;
mod health;
pub mod http;
pub mod parser;
mod process;
mod telemetry;
pub mod wrapper;

pub use api::{Api, Exposable};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Runtime, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use builtins::{BuiltinOperations, builtin_api};
pub use channel::{
    Channel, CommandLineChannel, QueueChannel, ScheduledTaskChannel, WebChannel,
};
pub use context::RequestContext;
pub use dispatcher::{DispatchError, Dispatcher, DispatcherBuilder, DispatcherHandle};
pub use errors::SetupError;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use parser::Parser;
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_runtime};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use wrapper::Wrapper;

#[cfg(test)]
mod tests;
