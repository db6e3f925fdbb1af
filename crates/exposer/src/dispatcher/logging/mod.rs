//! Request logging.
//!
//! Each dispatcher holds any number of [`Logger`]s. After every request the
//! worker builds one [`LogRecord`] and hands it to each logger; event loggers
//! write every record, error loggers only failed ones. A sink failure is
//! reported through `tracing` and never affects the response.

mod crypto;
mod record;
mod sink;

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use strum::{Display, EnumString};
use tracing::warn;

pub use self::crypto::{Crypto, NoCrypto, Redact};
pub use self::record::{LogRecord, format_arguments};
#[cfg(test)]
pub(crate) use self::sink::MockLogSink;
pub use self::sink::{JsonLinesSink, LogSink, LogSinkError, TracingLogSink};

pub(crate) const REQUEST_LOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::requests");

/// Which records a logger writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LoggerKind {
    /// Every request.
    Event,
    /// Failed requests only.
    Error,
}

/// A sink paired with a record filter and value protection.
#[derive(Clone)]
pub struct Logger {
    kind: LoggerKind,
    sink: Arc<dyn LogSink>,
    crypto: Arc<dyn Crypto>,
}

impl Logger {
    /// Logs every request to `sink`.
    pub fn event(sink: Arc<dyn LogSink>) -> Self {
        Self::new(LoggerKind::Event, sink)
    }

    /// Logs failed requests to `sink`.
    pub fn error(sink: Arc<dyn LogSink>) -> Self {
        Self::new(LoggerKind::Error, sink)
    }

    /// Logs to `sink` according to `kind`, without value protection.
    pub fn new(kind: LoggerKind, sink: Arc<dyn LogSink>) -> Self {
        Self {
            kind,
            sink,
            crypto: Arc::new(NoCrypto),
        }
    }

    /// Protects argument values and raw requests with `crypto`.
    #[must_use]
    pub fn with_crypto(mut self, crypto: Arc<dyn Crypto>) -> Self {
        self.crypto = crypto;
        self
    }

    /// Which records this logger writes.
    #[must_use]
    pub const fn kind(&self) -> LoggerKind {
        self.kind
    }

    /// Writes `record` if it passes the filter.
    pub(crate) fn log(&self, record: &LogRecord, names: &[String], values: &[String]) {
        if self.kind == LoggerKind::Error && !record.is_error {
            return;
        }
        let protected = record.protected(self.crypto.as_ref(), names, values);
        if let Err(error) = self.sink.write(&protected) {
            warn!(
                target: REQUEST_LOG_TARGET,
                logger = %self.kind,
                error = %error,
                "request log sink failed"
            );
        }
    }

    /// JSON snapshot of the logger.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        json!({ "kind": self.kind.to_string() })
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Logger")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use chrono::Utc;

    use super::*;

    fn record(is_error: bool) -> LogRecord {
        LogRecord {
            call_time: Utc::now(),
            method_name: "login".to_owned(),
            arguments: String::new(),
            filename: String::new(),
            response: "ok".to_owned(),
            thread: "web-worker-0".to_owned(),
            read_time_ms: 1,
            exec_time_ms: 2,
            write_time_ms: 3,
            sender: "127.0.0.1:9000".to_owned(),
            request: "login secret".to_owned(),
            is_error,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn error_loggers_skip_successful_requests() {
        let mut sink = MockLogSink::new();
        sink.expect_write()
            .withf(|record| record.is_error)
            .times(1)
            .returning(|_| Ok(()));
        let logger = Logger::error(Arc::new(sink));
        logger.log(&record(false), &[], &[]);
        logger.log(&record(true), &[], &[]);
    }

    #[test]
    fn crypto_protects_arguments_and_requests() {
        let mut sink = MockLogSink::new();
        sink.expect_write()
            .withf(|record| record.arguments == "User='***'" && record.request == "***")
            .times(1)
            .returning(|_| Ok(()));
        let logger = Logger::event(Arc::new(sink)).with_crypto(Arc::new(Redact));
        logger.log(&record(false), &strings(&["User"]), &strings(&["ada"]));
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let mut sink = MockLogSink::new();
        sink.expect_write()
            .times(1)
            .returning(|_| Err(LogSinkError::Io(io::Error::other("disk full"))));
        Logger::event(Arc::new(sink)).log(&record(true), &[], &[]);
    }

    #[test]
    fn json_lines_sink_writes_one_document_per_record() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.write(&record(false)).expect("first");
        sink.write(&record(true)).expect("second");
        let output = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value =
            serde_json::from_str(lines.get(1).expect("second line")).expect("json line");
        assert_eq!(second["method_name"], "login");
        assert_eq!(second["is_error"], true);
        assert_eq!(second["write_time_ms"], 3);
    }
}
