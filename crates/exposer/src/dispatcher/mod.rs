//! Dispatchers bind a channel, a parser and a wrapper to a worker pool.
//!
//! [`Dispatcher::builder`] collects the parts; [`DispatcherBuilder::start`]
//! clones the channel once per extra worker and spawns one named OS thread per
//! clone. Every worker runs the same loop: read a request, parse it, invoke the
//! operation, wrap the outcome, write the response and hand a record to each
//! logger. The returned [`DispatcherHandle`] stops and joins the workers.

mod errors;
pub mod logging;
mod worker;

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde_json::json;
use tracing::info;

pub use self::errors::DispatchError;
use self::logging::Logger;
use self::worker::WorkerShared;
use crate::api::Api;
use crate::channel::{Channel, StopSignal};
use crate::errors::SetupError;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::parser::Parser;
use crate::wrapper::Wrapper;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

const MAX_THREADS: i64 = 100;

/// Entry point for configuring dispatchers.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher;

impl Dispatcher {
    /// Starts describing a dispatcher called `name`.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        channel: impl Channel + 'static,
        parser: impl Parser + 'static,
        wrapper: impl Wrapper + 'static,
        api: Arc<Api>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            name: name.into(),
            channel: Box::new(channel),
            parser: Box::new(parser),
            wrapper: Box::new(wrapper),
            api,
            threads: 1,
            access_level: 1,
            synchronized: false,
            loggers: Vec::new(),
            reporter: Arc::new(StructuredHealthReporter::new()),
        }
    }
}

/// Collects the settings of one dispatcher.
pub struct DispatcherBuilder {
    name: String,
    channel: Box<dyn Channel>,
    parser: Box<dyn Parser>,
    wrapper: Box<dyn Wrapper>,
    api: Arc<Api>,
    threads: usize,
    access_level: i32,
    synchronized: bool,
    loggers: Vec<Logger>,
    reporter: Arc<dyn HealthReporter>,
}

impl DispatcherBuilder {
    /// Number of worker threads, 1 to 100.
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Access level every request of this dispatcher runs with.
    #[must_use]
    pub const fn access_level(mut self, level: i32) -> Self {
        self.access_level = level;
        self
    }

    /// Serialises request processing across all workers.
    #[must_use]
    pub const fn synchronized(mut self, synchronized: bool) -> Self {
        self.synchronized = synchronized;
        self
    }

    /// Adds a request logger.
    #[must_use]
    pub fn logger(mut self, logger: Logger) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Spawns the workers.
    ///
    /// # Errors
    ///
    /// Fails when the thread count is out of range, when the channel cannot
    /// be cloned for the extra workers, or when a thread cannot be spawned.
    /// Workers already running are stopped before the error is returned.
    pub fn start(self) -> Result<DispatcherHandle, SetupError> {
        let requested = i64::try_from(self.threads).unwrap_or(i64::MAX);
        SetupError::ensure_range("threads", requested, 1, MAX_THREADS)?;
        let Self {
            name,
            channel,
            parser,
            wrapper,
            api,
            threads,
            access_level,
            synchronized,
            loggers,
            reporter,
        } = self;

        let mut channels = Vec::with_capacity(threads);
        for _ in 1..threads {
            channels.push(channel.try_clone()?);
        }
        let status = json!({
            "name": name,
            "threads": threads,
            "access_level": access_level,
            "synchronized": synchronized,
            "loggers": loggers.iter().map(Logger::status).collect::<Vec<_>>(),
            "channel": channel.status(),
        });
        let stop = channel.stop_signal();
        let local_addr = channel.local_addr();
        channels.insert(0, channel);

        reporter.dispatcher_starting(&name, threads);
        let shared = Arc::new(WorkerShared {
            name: name.clone(),
            parser,
            wrapper,
            api,
            access_level,
            loggers,
            lock: synchronized.then(|| Mutex::new(())),
        });
        let mut handle = DispatcherHandle {
            name,
            stop,
            workers: Vec::with_capacity(threads),
            reporter,
            status,
            local_addr,
        };
        for (index, channel) in channels.into_iter().enumerate() {
            let worker = format!("{}-worker-{index}", handle.name);
            let shared = Arc::clone(&shared);
            let thread_name = worker.clone();
            let spawned = thread::Builder::new()
                .name(worker.clone())
                .spawn(move || shared.run(channel, &thread_name));
            match spawned {
                Ok(join) => handle.workers.push(Worker { name: worker, join }),
                Err(source) => {
                    handle.stop.raise();
                    return Err(SetupError::Spawn { name: worker, source });
                }
            }
        }
        info!(
            target: DISPATCH_TARGET,
            dispatcher = %handle.name,
            threads,
            "dispatcher workers spawned"
        );
        handle.reporter.dispatcher_started(&handle.name, threads);
        Ok(handle)
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatcherBuilder")
            .field("name", &self.name)
            .field("threads", &self.threads)
            .field("access_level", &self.access_level)
            .field("synchronized", &self.synchronized)
            .field("loggers", &self.loggers)
            .finish_non_exhaustive()
    }
}

struct Worker {
    name: String,
    join: JoinHandle<()>,
}

/// Handle to the worker threads of a running dispatcher.
///
/// Dropping the handle signals shutdown without waiting for the workers.
pub struct DispatcherHandle {
    name: String,
    stop: StopSignal,
    workers: Vec<Worker>,
    reporter: Arc<dyn HealthReporter>,
    status: serde_json::Value,
    local_addr: Option<SocketAddr>,
}

impl DispatcherHandle {
    /// Dispatcher name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the channel listens on, for socket channels.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Asks every worker's channel to stop delivering requests.
    pub fn shutdown(&self) {
        self.stop.raise();
    }

    /// Waits for every worker to exit.
    ///
    /// # Errors
    ///
    /// Returns the first worker panic; every worker is joined regardless.
    pub fn join(mut self) -> Result<(), DispatchError> {
        let mut outcome = Ok(());
        for worker in self.workers.drain(..) {
            if worker.join.join().is_err() {
                let error = DispatchError::worker_panicked(&self.name, worker.name);
                self.reporter.worker_failed(&error);
                if outcome.is_ok() {
                    outcome = Err(error);
                }
            }
        }
        self.reporter.dispatcher_stopped(&self.name);
        outcome
    }

    /// Stops the workers and waits for them.
    ///
    /// # Errors
    ///
    /// See [`DispatcherHandle::join`].
    pub fn stop(self) -> Result<(), DispatchError> {
        self.shutdown();
        self.join()
    }

    /// JSON snapshot of the dispatcher settings and its channel at start.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        let mut status = self.status.clone();
        if let Some(fields) = status.as_object_mut() {
            fields.insert(
                "running".to_owned(),
                json!(self.workers.iter().filter(|worker| !worker.join.is_finished()).count()),
            );
        }
        status
    }
}

impl fmt::Debug for DispatcherHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DispatcherHandle")
            .field("name", &self.name)
            .field("workers", &self.workers.len())
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.stop.raise();
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};
    use std::net::{Shutdown, TcpListener, TcpStream};
    use std::sync::PoisonError;

    use camino::Utf8PathBuf;

    use rstest::{fixture, rstest};

    use super::logging::{LogRecord, LogSink, LogSinkError};
    use super::*;
    use crate::api::{Declaration, Exposable, OperationFailure, Value};
    use crate::channel::{CommandLineChannel, WebChannel, WebChannelOptions};
    use crate::parser::{HttpParser, TextParser};
    use crate::wrapper::{CsvWrapper, WebWrapper};

    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<LogRecord>>);

    impl RecordingSink {
        fn records(&self) -> Vec<LogRecord> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    impl LogSink for RecordingSink {
        fn write(&self, record: &LogRecord) -> Result<(), LogSinkError> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.clone());
            Ok(())
        }
    }

    struct Shouter;

    impl Exposable for Shouter {
        fn declarations(&self) -> Vec<Declaration> {
            vec![
                Declaration::new("shout", |call| Ok(Value::from(call.str(0)?.to_uppercase())))
                    .arguments(["String"]),
                Declaration::new("refuse", |_call| Err(OperationFailure::new("not today"))),
                Declaration::new("secret", |_call| Ok(Value::from("hidden"))).access_level(5),
            ]
        }
    }

    #[fixture]
    fn api() -> Arc<Api> {
        let mut api = Api::new().expect("built-ins");
        api.register(&Shouter).expect("register shouter");
        Arc::new(api)
    }

    fn cli_channel(input: &str) -> (CommandLineChannel<Cursor<Vec<u8>>, SharedOutput>, SharedOutput) {
        let output = SharedOutput::default();
        let channel = CommandLineChannel::new(Cursor::new(input.as_bytes().to_vec()), output.clone());
        (channel, output)
    }

    #[rstest]
    fn serves_requests_until_the_channel_closes(api: Arc<Api>) {
        let (channel, output) = cli_channel("shout hello\nrefuse\nexit\n");
        let handle = Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .start()
            .expect("start");
        handle.join().expect("join");
        let text = output.text();
        assert!(text.starts_with("HELLO\n"), "unexpected output: {text}");
        assert!(text.contains("Error:"), "unexpected output: {text}");
        assert!(text.contains("not today"), "unexpected output: {text}");
    }

    #[rstest]
    fn dispatcher_access_level_applies_to_every_call(api: Arc<Api>) {
        let (channel, output) = cli_channel("secret\n");
        Dispatcher::builder("cli", channel, TextParser, CsvWrapper, Arc::clone(&api))
            .access_level(1)
            .start()
            .expect("start")
            .join()
            .expect("join");
        assert!(output.text().contains("access"), "unexpected: {}", output.text());

        let (channel, elevated) = cli_channel("secret\n");
        Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .access_level(5)
            .start()
            .expect("start")
            .join()
            .expect("join");
        assert_eq!(elevated.text(), "hidden\n");
    }

    #[rstest]
    fn loggers_receive_tagged_records(api: Arc<Api>) {
        let events = Arc::new(RecordingSink::default());
        let errors = Arc::new(RecordingSink::default());
        let (channel, _output) = cli_channel("shout hi\nmissing\n");
        Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .logger(Logger::event(Arc::clone(&events) as Arc<dyn LogSink>))
            .logger(Logger::error(Arc::clone(&errors) as Arc<dyn LogSink>))
            .start()
            .expect("start")
            .join()
            .expect("join");

        let events = events.records();
        assert_eq!(events.len(), 2);
        let first = events.first().expect("first record");
        assert_eq!(first.method_name, "shout");
        assert_eq!(first.arguments, "'hi'");
        assert_eq!(first.response, "HI");
        assert_eq!(first.thread, "cli-worker-0");
        assert_eq!(first.sender, "CommandLine");
        assert!(!first.is_error);

        let errors = errors.records();
        assert_eq!(errors.len(), 1);
        let failed = errors.first().expect("error record");
        assert_eq!(failed.method_name, "missing");
        assert!(failed.is_error);
    }

    #[rstest]
    fn web_records_carry_the_peer_address(api: Arc<Api>) {
        let root = tempfile::tempdir().expect("web root");
        let web_root = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).expect("utf8 root");
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let channel =
            WebChannel::with_listener(listener, WebChannelOptions::default()).expect("web channel");
        let wrapper = WebWrapper::builder(web_root).build().expect("web wrapper");
        let events = Arc::new(RecordingSink::default());
        let handle = Dispatcher::builder("web", channel, HttpParser, wrapper, api)
            .logger(Logger::event(Arc::clone(&events) as Arc<dyn LogSink>))
            .start()
            .expect("start");
        let addr = handle.local_addr().expect("bound address");

        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .write_all(b"GET /api/shout?quiet HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .expect("send request");
        stream.shutdown(Shutdown::Write).expect("half close");
        let mut response = String::new();
        stream.read_to_string(&mut response).expect("read response");
        handle.stop().expect("stop");

        assert!(response.ends_with("QUIET"), "unexpected response: {response}");
        let records = events.records();
        let record = records.first().expect("one record");
        assert_eq!(record.method_name, "shout");
        assert!(
            record.sender.starts_with("127.0.0.1:"),
            "unexpected sender: {:?}",
            record.sender
        );
    }

    #[rstest]
    #[case(0)]
    #[case(101)]
    fn rejects_thread_counts_out_of_range(api: Arc<Api>, #[case] threads: usize) {
        let (channel, _output) = cli_channel("");
        let error = Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .threads(threads)
            .start()
            .expect_err("threads out of range");
        assert!(matches!(error, SetupError::OutOfRange { .. }), "{error:?}");
    }

    #[rstest]
    fn single_resource_channels_cannot_fan_out(api: Arc<Api>) {
        let (channel, _output) = cli_channel("");
        let error = Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .threads(2)
            .start()
            .expect_err("command line cannot be cloned");
        assert!(matches!(error, SetupError::Channel(_)), "{error:?}");
    }

    #[rstest]
    fn status_reports_settings(api: Arc<Api>) {
        let (channel, _output) = cli_channel("");
        let handle = Dispatcher::builder("cli", channel, TextParser, CsvWrapper, api)
            .access_level(3)
            .synchronized(true)
            .logger(Logger::event(Arc::new(RecordingSink::default())))
            .start()
            .expect("start");
        let status = handle.status();
        assert_eq!(status["name"], "cli");
        assert_eq!(status["threads"], 1);
        assert_eq!(status["access_level"], 3);
        assert_eq!(status["synchronized"], true);
        assert_eq!(status["loggers"][0]["kind"], "event");
        assert_eq!(status["channel"]["kind"], "command_line");
        handle.stop().expect("stop");
    }
}
