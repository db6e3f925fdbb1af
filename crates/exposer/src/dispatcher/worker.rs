//! The per-thread request loop.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::logging::{LogRecord, Logger};
use crate::api::{Api, CallError};
use crate::channel::{Channel, ChannelError};
use crate::context::RequestContext;
use crate::parser::{Parser, Request};
use crate::wrapper::Wrapper;

const CHANNEL_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// State shared by every worker of one dispatcher.
pub(super) struct WorkerShared {
    pub(super) name: String,
    pub(super) parser: Box<dyn Parser>,
    pub(super) wrapper: Box<dyn Wrapper>,
    pub(super) api: std::sync::Arc<Api>,
    pub(super) access_level: i32,
    pub(super) loggers: Vec<Logger>,
    pub(super) lock: Option<Mutex<()>>,
}

/// Result of processing one request.
struct Processed {
    response: Vec<u8>,
    method_name: String,
    filename: String,
    names: Vec<String>,
    values: Vec<String>,
    response_text: String,
    is_error: bool,
}

impl Processed {
    const fn empty() -> Self {
        Self {
            response: Vec::new(),
            method_name: String::new(),
            filename: String::new(),
            names: Vec::new(),
            values: Vec::new(),
            response_text: String::new(),
            is_error: false,
        }
    }
}

impl WorkerShared {
    /// Serves requests from `channel` until it reports shutdown.
    pub(super) fn run(&self, mut channel: Box<dyn Channel>, worker: &str) {
        debug!(
            target: DISPATCH_TARGET,
            dispatcher = %self.name,
            worker,
            "worker running"
        );
        let mut buffer = Vec::new();
        loop {
            match channel.get_request(&mut buffer) {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    self.channel_failed(&error, worker);
                    continue;
                }
            }
            let call_time = Utc::now();
            let started = Instant::now();
            let sender = channel.sender_info();
            let (processed, exec_time) = match &self.lock {
                Some(lock) => {
                    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                    self.serve(channel.as_mut(), &buffer, sender.clone(), started, worker)
                }
                None => self.serve(channel.as_mut(), &buffer, sender.clone(), started, worker),
            };
            if self.loggers.is_empty() {
                continue;
            }
            let record = LogRecord {
                call_time,
                method_name: processed.method_name,
                arguments: String::new(),
                filename: processed.filename,
                response: processed.response_text,
                thread: worker.to_owned(),
                read_time_ms: millis(channel.request_read_time()),
                exec_time_ms: millis(exec_time),
                write_time_ms: millis(channel.response_write_time()),
                sender,
                request: String::from_utf8_lossy(&buffer).into_owned(),
                is_error: processed.is_error,
            };
            for logger in &self.loggers {
                logger.log(&record, &processed.names, &processed.values);
            }
        }
        debug!(
            target: DISPATCH_TARGET,
            dispatcher = %self.name,
            worker,
            "worker stopped"
        );
    }

    /// Processes one request and writes its response.
    ///
    /// Returns the outcome and the time spent before the write started.
    fn serve(
        &self,
        channel: &mut dyn Channel,
        raw: &[u8],
        sender: String,
        started: Instant,
        worker: &str,
    ) -> (Processed, Duration) {
        let processed = self.process(raw, sender);
        let exec_time = started.elapsed();
        if let Err(error) = channel.write_response(&processed.response) {
            warn!(
                target: DISPATCH_TARGET,
                dispatcher = %self.name,
                worker,
                error = %error,
                "failed to write response"
            );
        }
        (processed, exec_time)
    }

    fn channel_failed(&self, error: &ChannelError, worker: &str) {
        warn!(
            target: DISPATCH_TARGET,
            dispatcher = %self.name,
            worker,
            error = %error,
            "channel failed to deliver a request"
        );
        if !matches!(
            error,
            ChannelError::ReadTimeout { .. } | ChannelError::RequestTooLarge { .. }
        ) {
            thread::sleep(CHANNEL_ERROR_BACKOFF);
        }
    }

    /// Parses, resolves, invokes and wraps one request.
    fn process(&self, raw: &[u8], sender: String) -> Processed {
        let mut context = RequestContext::new(sender, self.access_level);
        let mut request = match self.parser.parse(raw) {
            Ok(request) => request,
            Err(error) => return self.failed(Processed::empty(), &error, &context),
        };
        context.set_incoming_cookies(request.take_cookies());
        if let Some(path) = request.file_path() {
            let mut processed = Processed::empty();
            processed.filename = path.to_owned();
            return match self.wrapper.wrap_file(path, &context) {
                Ok(response) => Processed {
                    response,
                    ..processed
                },
                Err(error) => self.failed(processed, &error, &context),
            };
        }
        let processed = Self::describe(&request);
        let outcome = self.api.resolve(request.operation()).and_then(|operation| {
            operation.invoke(
                &self.api,
                request.values(),
                request.names(),
                self.access_level,
                &mut context,
            )
        });
        match outcome {
            Ok(value) => Processed {
                response: self.wrapper.wrap_response(&value, &context),
                response_text: value.to_canonical_string(),
                ..processed
            },
            Err(error) => self.failed(processed, &error, &context),
        }
    }

    fn describe(request: &Request) -> Processed {
        let mut processed = Processed::empty();
        processed.method_name = request.operation().to_owned();
        processed.names = request.names().to_vec();
        processed.values = request.values().to_vec();
        processed
    }

    fn failed(&self, processed: Processed, error: &CallError, context: &RequestContext) -> Processed {
        debug!(
            target: DISPATCH_TARGET,
            dispatcher = %self.name,
            kind = error.kind(),
            error = %error,
            "request failed"
        );
        Processed {
            response: self.wrapper.wrap_error(&error.fields(), context),
            response_text: error.to_string(),
            is_error: true,
            ..processed
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
