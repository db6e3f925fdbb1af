//! Default values shared by the configuration loader and the runtime.

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default TCP port for the web channel.
pub const DEFAULT_WEB_PORT: u16 = 5555;

/// Default number of web worker threads.
pub const DEFAULT_WEB_THREADS: usize = 10;

/// Default socket read timeout for the web channel, in milliseconds.
pub const DEFAULT_WEB_TIMEOUT_MS: u64 = 300;

/// Default directory holding files served by the web wrapper.
pub const DEFAULT_WEB_ROOT: &str = "web";

/// Default browser cache age for served files, in seconds.
pub const DEFAULT_BROWSER_CACHE_MAX_AGE: u32 = 1000;

/// Default access level granted to web callers.
pub const DEFAULT_WEB_ACCESS_LEVEL: i32 = 1;

/// Default access level granted to command line callers.
pub const DEFAULT_COMMAND_LINE_ACCESS_LEVEL: i32 = 3;

/// Name reported in the `Server` response header.
pub const DEFAULT_SERVER_NAME: &str = "exposer";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default web root directory.
#[must_use]
pub fn default_web_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_WEB_ROOT)
}

/// Owned server name used where allocation is required.
#[must_use]
pub fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_owned()
}
