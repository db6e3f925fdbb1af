//! Destinations for request log records.

use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use super::{LogRecord, REQUEST_LOG_TARGET};

/// Errors raised while writing a record.
#[derive(Debug, Error)]
pub enum LogSinkError {
    /// The record could not be serialised.
    #[error("failed to serialise log record: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The destination rejected the write.
    #[error("failed to write log record: {0}")]
    Io(#[from] io::Error),
}

/// Receives request log records.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns a [`LogSinkError`] when the record cannot be stored.
    fn write(&self, record: &LogRecord) -> Result<(), LogSinkError>;
}

/// Emits records as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn write(&self, record: &LogRecord) -> Result<(), LogSinkError> {
        tracing::info!(
            target: REQUEST_LOG_TARGET,
            call_time = %record.call_time,
            method_name = %record.method_name,
            arguments = %record.arguments,
            filename = %record.filename,
            response = %record.response,
            thread = %record.thread,
            read_time_ms = record.read_time_ms,
            exec_time_ms = record.exec_time_ms,
            write_time_ms = record.write_time_ms,
            sender = %record.sender,
            request = %record.request,
            is_error = record.is_error,
            "request processed"
        );
        Ok(())
    }
}

/// Writes one JSON document per record and line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl JsonLinesSink<Stdout> {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Gives back the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> LogSink for JsonLinesSink<W> {
    fn write(&self, record: &LogRecord) -> Result<(), LogSinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}
