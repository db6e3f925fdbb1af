//! Error types for channel operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading requests or writing responses.
///
/// All of them concern a single connection or poll; the worker logs them and
/// keeps serving.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer did not send a complete request in time.
    #[error("reading from {peer} timed out after {timeout_ms} ms")]
    ReadTimeout {
        /// Peer address.
        peer: String,
        /// Configured read timeout.
        timeout_ms: u64,
    },
    /// Socket or stream failure.
    #[error("I/O error while {action}: {source}")]
    Io {
        /// What the channel was doing.
        action: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The request grew past the size limit.
    #[error("request exceeds the {max_bytes} byte limit")]
    RequestTooLarge {
        /// The limit.
        max_bytes: usize,
    },
    /// The channel owns a single resource and cannot serve extra workers.
    #[error("{channel} channels cannot be cloned")]
    CloneUnsupported {
        /// Channel kind.
        channel: &'static str,
    },
    /// A response was written without a request being read first.
    #[error("no active connection to write the response to")]
    NoActiveConnection,
    /// The queue backend failed.
    #[error("queue error: {message}")]
    Queue {
        /// Backend diagnostic.
        message: String,
    },
}

impl ChannelError {
    /// Creates an I/O error tagged with the failing action.
    #[must_use]
    pub const fn io(action: &'static str, source: io::Error) -> Self {
        Self::Io { action, source }
    }

    /// Creates a clone-unsupported error.
    #[must_use]
    pub const fn clone_unsupported(channel: &'static str) -> Self {
        Self::CloneUnsupported { channel }
    }
}
