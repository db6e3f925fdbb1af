//! Channels deliver raw requests to dispatcher workers and carry responses
//! back.
//!
//! A channel is owned by exactly one worker. Dispatchers with several workers
//! obtain the extra instances through [`Channel::try_clone`]; clones share the
//! underlying resource (a listening socket, a queue) and the stop signal.

mod command_line;
mod errors;
mod queue;
mod stop;
mod task;
mod web;

use std::net::SocketAddr;
use std::time::Duration;

pub use command_line::CommandLineChannel;
pub use errors::ChannelError;
pub use queue::{MpscQueue, Poll, QueueChannel, QueueMessage, QueueReceiver};
pub use stop::StopSignal;
pub use task::{Clock, FixedClock, Schedule, ScheduledTaskChannel, SystemClock};
pub use web::{GHOST_REPLY, MAX_REQUEST_BYTES, Redirect, WebChannel, WebChannelOptions};

/// Target used by channel diagnostics.
pub(crate) const CHANNEL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::channel");

/// Source of requests for one dispatcher worker.
pub trait Channel: Send {
    /// Blocks until a request is available and copies it into `buffer`.
    ///
    /// Returns `Ok(false)` once the channel has been shut down; the worker then
    /// exits. Errors concern a single request and the worker keeps polling.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] when the request could not be read.
    fn get_request(&mut self, buffer: &mut Vec<u8>) -> Result<bool, ChannelError>;

    /// Sends the wrapped response for the request last returned.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] when the response could not be delivered.
    fn write_response(&mut self, response: &[u8]) -> Result<(), ChannelError>;

    /// Signal shared by this channel and all of its clones.
    fn stop_signal(&self) -> StopSignal;

    /// Asks every worker blocked on this channel, or on a clone of it, to exit.
    fn shutdown(&self) {
        self.stop_signal().raise();
    }

    /// Creates another handle for an extra worker.
    ///
    /// # Errors
    ///
    /// Single-resource channels return [`ChannelError::CloneUnsupported`].
    fn try_clone(&self) -> Result<Box<dyn Channel>, ChannelError>;

    /// Time spent reading the last request.
    fn request_read_time(&self) -> Duration;

    /// Time spent writing the last response.
    fn response_write_time(&self) -> Duration;

    /// Describes who sent the request being served.
    ///
    /// Only meaningful between a successful `get_request` and the matching
    /// `write_response`.
    fn sender_info(&self) -> String;

    /// JSON snapshot of the channel configuration and state.
    fn status(&self) -> serde_json::Value;

    /// Address the channel listens on, for socket channels.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}
