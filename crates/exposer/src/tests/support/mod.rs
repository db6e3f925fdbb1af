//! Shared fixtures for behaviour tests.

mod config_loader;
mod http;
mod reporter;

pub use config_loader::{FailingConfigLoader, InvalidConfigLoader, TestConfigLoader};
pub use http::{body_of, exchange, get};
pub use reporter::{HealthEvent, RecordingHealthReporter};

/// Strips the double quotes around a step argument, if present.
pub fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}
