//! Channel long-polling a message queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::warn;

use super::{CHANNEL_TARGET, Channel, ChannelError, StopSignal};

/// Default long-poll wait.
const DEFAULT_WAIT: Duration = Duration::from_secs(20);

/// One message taken from a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Receipt used to delete the message.
    pub id: String,
    /// Request text.
    pub body: Vec<u8>,
}

/// Outcome of one long poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// A message arrived.
    Message(QueueMessage),
    /// The wait elapsed without a message.
    Empty,
    /// The queue will never deliver again.
    Closed,
}

/// Client side of a message queue.
#[cfg_attr(test, mockall::automock)]
pub trait QueueReceiver: Send + Sync {
    /// Waits up to `wait` for one message.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Queue`] when the backend fails.
    fn receive(&self, wait: Duration) -> Result<Poll, ChannelError>;

    /// Removes a received message so that it is not delivered again.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Queue`] when the backend fails.
    fn delete(&self, id: &str) -> Result<(), ChannelError>;
}

/// In-process queue backed by a standard channel.
#[derive(Debug)]
pub struct MpscQueue {
    receiver: Mutex<Receiver<Vec<u8>>>,
    next_id: AtomicU64,
}

impl MpscQueue {
    /// Creates the queue and the sender feeding it.
    #[must_use]
    pub fn channel() -> (Sender<Vec<u8>>, Self) {
        let (sender, receiver) = mpsc::channel();
        let queue = Self {
            receiver: Mutex::new(receiver),
            next_id: AtomicU64::new(0),
        };
        (sender, queue)
    }
}

impl QueueReceiver for MpscQueue {
    fn receive(&self, wait: Duration) -> Result<Poll, ChannelError> {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        match receiver.recv_timeout(wait) {
            Ok(body) => Ok(Poll::Message(QueueMessage {
                id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
                body,
            })),
            Err(RecvTimeoutError::Timeout) => Ok(Poll::Empty),
            Err(RecvTimeoutError::Disconnected) => Ok(Poll::Closed),
        }
    }

    fn delete(&self, _id: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Turns queue messages into requests.
///
/// Messages are deleted as soon as they are received, so each one is
/// processed at most once. Responses are discarded. The stop signal is
/// checked between polls; a shutdown therefore takes effect within one wait.
pub struct QueueChannel {
    receiver: Arc<dyn QueueReceiver>,
    wait: Duration,
    stop: StopSignal,
    read_time: Duration,
    current: Option<String>,
}

impl QueueChannel {
    /// Polls `receiver` with the default 20 second wait.
    #[must_use]
    pub fn new(receiver: Arc<dyn QueueReceiver>) -> Self {
        Self {
            receiver,
            wait: DEFAULT_WAIT,
            stop: StopSignal::new(),
            read_time: Duration::ZERO,
            current: None,
        }
    }

    /// Overrides the long-poll wait.
    #[must_use]
    pub const fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }
}

impl Channel for QueueChannel {
    fn get_request(&mut self, buffer: &mut Vec<u8>) -> Result<bool, ChannelError> {
        self.current = None;
        let started = Instant::now();
        while !self.stop.is_raised() {
            match self.receiver.receive(self.wait)? {
                Poll::Message(message) => {
                    if let Err(error) = self.receiver.delete(&message.id) {
                        warn!(
                            target: CHANNEL_TARGET,
                            message_id = %message.id,
                            error = %error,
                            "failed to delete queue message"
                        );
                    }
                    buffer.clear();
                    buffer.extend_from_slice(&message.body);
                    self.current = Some(message.id);
                    self.read_time = started.elapsed();
                    return Ok(true);
                }
                Poll::Empty => {}
                Poll::Closed => return Ok(false),
            }
        }
        Ok(false)
    }

    fn write_response(&mut self, _response: &[u8]) -> Result<(), ChannelError> {
        Ok(())
    }

    fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn try_clone(&self) -> Result<Box<dyn Channel>, ChannelError> {
        Ok(Box::new(Self {
            receiver: Arc::clone(&self.receiver),
            wait: self.wait,
            stop: self.stop.clone(),
            read_time: Duration::ZERO,
            current: None,
        }))
    }

    fn request_read_time(&self) -> Duration {
        self.read_time
    }

    fn response_write_time(&self) -> Duration {
        Duration::ZERO
    }

    fn sender_info(&self) -> String {
        self.current
            .as_ref()
            .map_or_else(|| "Queue".to_owned(), |id| format!("Queue: message {id}"))
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "kind": "queue",
            "wait_ms": u64::try_from(self.wait.as_millis()).unwrap_or(u64::MAX),
            "stopped": self.stop.is_raised(),
        })
    }
}
