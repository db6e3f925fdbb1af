//! Range checks applied to a loaded [`Config`].

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::Config;

/// Accepted number of web worker threads.
pub const WEB_THREADS_RANGE: RangeInclusive<usize> = 1..=100;

/// Accepted web read timeout, in milliseconds.
pub const WEB_TIMEOUT_MS_RANGE: RangeInclusive<u64> = 50..=30_000;

/// Accepted browser cache max age, in seconds (one week at most).
pub const BROWSER_CACHE_MAX_AGE_RANGE: RangeInclusive<u32> = 0..=604_800;

/// Errors raised when a configuration value falls outside its accepted range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A numeric setting was outside its bounds.
    #[error("{field} must be between {min} and {max}, was {value}")]
    OutOfRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Supplied value.
        value: u64,
        /// Lowest accepted value.
        min: u64,
        /// Highest accepted value.
        max: u64,
    },
    /// Port zero cannot be listened on by a configured server.
    #[error("web_port must be between 1 and 65535")]
    InvalidPort,
    /// The server name would corrupt the response header block.
    #[error("server_name must be non-empty and free of line breaks")]
    InvalidServerName,
}

impl Config {
    /// Checks every bounded setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.web_port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }
        check_range("web_threads", widen(self.web_threads), &widen_range(&WEB_THREADS_RANGE))?;
        check_range("web_timeout_ms", self.web_timeout_ms, &WEB_TIMEOUT_MS_RANGE)?;
        check_range(
            "browser_cache_max_age",
            u64::from(self.browser_cache_max_age),
            &(u64::from(*BROWSER_CACHE_MAX_AGE_RANGE.start())
                ..=u64::from(*BROWSER_CACHE_MAX_AGE_RANGE.end())),
        )?;
        if self.server_name.trim().is_empty()
            || self.server_name.contains(['\r', '\n'])
        {
            return Err(ConfigValidationError::InvalidServerName);
        }
        Ok(())
    }
}

fn widen(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn widen_range(range: &RangeInclusive<usize>) -> RangeInclusive<u64> {
    widen(*range.start())..=widen(*range.end())
}

fn check_range(
    field: &'static str,
    value: u64,
    range: &RangeInclusive<u64>,
) -> Result<(), ConfigValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[rstest]
    #[case::no_threads(Config { web_threads: 0, ..Config::default() }, "web_threads")]
    #[case::too_many_threads(Config { web_threads: 101, ..Config::default() }, "web_threads")]
    #[case::short_timeout(Config { web_timeout_ms: 49, ..Config::default() }, "web_timeout_ms")]
    #[case::long_timeout(Config { web_timeout_ms: 30_001, ..Config::default() }, "web_timeout_ms")]
    #[case::cache_age(
        Config { browser_cache_max_age: 604_801, ..Config::default() },
        "browser_cache_max_age"
    )]
    fn rejects_out_of_range_values(#[case] config: Config, #[case] expected: &str) {
        let error = config.validate().expect_err("value should be rejected");
        assert!(
            matches!(error, ConfigValidationError::OutOfRange { field, .. } if field == expected),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn rejects_port_zero() {
        let config = Config {
            web_port: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidPort));
    }

    #[test]
    fn rejects_server_name_with_line_break() {
        let config = Config {
            server_name: "evil\r\nX-Injected: 1".to_owned(),
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidServerName)
        );
    }
}
