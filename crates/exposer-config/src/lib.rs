//! Shared configuration for the exposer dispatch runtime.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an optional
//! TOML file, then `EXPOSER_*` environment variables, then command line flags.
//! The runtime calls [`Config::validate`] before building any dispatcher so
//! that out-of-range values fail at startup rather than on the first request.

mod defaults;
mod logging;
mod validation;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BROWSER_CACHE_MAX_AGE, DEFAULT_COMMAND_LINE_ACCESS_LEVEL, DEFAULT_LOG_FILTER,
    DEFAULT_SERVER_NAME, DEFAULT_WEB_ACCESS_LEVEL, DEFAULT_WEB_PORT, DEFAULT_WEB_ROOT,
    DEFAULT_WEB_THREADS, DEFAULT_WEB_TIMEOUT_MS, default_log_filter, default_log_filter_string,
    default_log_format, default_server_name, default_web_root,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use validation::{
    BROWSER_CACHE_MAX_AGE_RANGE, ConfigValidationError, WEB_THREADS_RANGE, WEB_TIMEOUT_MS_RANGE,
};

/// Runtime configuration for the dispatch daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "EXPOSER")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `exposer=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format of diagnostic logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// TCP port the web channel listens on.
    #[ortho_config(default = defaults::DEFAULT_WEB_PORT)]
    pub web_port: u16,
    /// Number of worker threads accepting web requests.
    #[ortho_config(default = defaults::DEFAULT_WEB_THREADS)]
    pub web_threads: usize,
    /// Per-connection read timeout in milliseconds.
    #[ortho_config(default = defaults::DEFAULT_WEB_TIMEOUT_MS)]
    pub web_timeout_ms: u64,
    /// Directory holding the files served by the web wrapper.
    #[ortho_config(default = defaults::default_web_root())]
    pub web_root: Utf8PathBuf,
    /// `Cache-Control` max age for served files, in seconds.
    #[ortho_config(default = defaults::DEFAULT_BROWSER_CACHE_MAX_AGE)]
    pub browser_cache_max_age: u32,
    /// Keeps served files in memory once read.
    #[ortho_config(default = true)]
    pub cache_files: bool,
    /// Access level granted to callers arriving over the web channel.
    #[ortho_config(default = defaults::DEFAULT_WEB_ACCESS_LEVEL)]
    pub web_access_level: i32,
    /// Value of the `Server` response header.
    #[ortho_config(default = defaults::default_server_name())]
    pub server_name: String,
    /// Starts a dispatcher reading requests from standard input.
    #[ortho_config(default = false)]
    pub command_line: bool,
    /// Access level granted to command line callers.
    #[ortho_config(default = defaults::DEFAULT_COMMAND_LINE_ACCESS_LEVEL)]
    pub command_line_access_level: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            web_port: DEFAULT_WEB_PORT,
            web_threads: DEFAULT_WEB_THREADS,
            web_timeout_ms: DEFAULT_WEB_TIMEOUT_MS,
            web_root: default_web_root(),
            browser_cache_max_age: DEFAULT_BROWSER_CACHE_MAX_AGE,
            cache_files: true,
            web_access_level: DEFAULT_WEB_ACCESS_LEVEL,
            server_name: default_server_name(),
            command_line: false,
            command_line_access_level: DEFAULT_COMMAND_LINE_ACCESS_LEVEL,
        }
    }
}

impl Config {
    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format of diagnostic logs.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Directory holding the files served by the web wrapper.
    #[must_use]
    pub fn web_root(&self) -> &Utf8Path {
        &self.web_root
    }
}
