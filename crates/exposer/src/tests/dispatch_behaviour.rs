//! Dispatcher behaviour across channels, loggers and health reporting.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{HealthEvent, RecordingHealthReporter, unquote};
use crate::api::{Api, Declaration, Exposable, Value};
use crate::channel::{MpscQueue, QueueChannel};
use crate::dispatcher::logging::{LogRecord, LogSink, LogSinkError, Logger, Redact};
use crate::dispatcher::{Dispatcher, DispatcherBuilder};
use crate::health::HealthReporter;
use crate::parser::TextParser;
use crate::wrapper::JsonWrapper;

const DISPATCHER_NAME: &str = "queue";

#[derive(Default)]
struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl Occupancy {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Slow(Arc<Occupancy>);

impl Exposable for Slow {
    fn declarations(&self) -> Vec<Declaration> {
        let occupancy = Arc::clone(&self.0);
        vec![
            Declaration::new("work", move |call| {
                occupancy.enter();
                thread::sleep(Duration::from_millis(20));
                occupancy.leave();
                Ok(Value::from(call.str(0)?.to_owned()))
            })
            .arguments(["String"]),
        ]
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

struct QueueWorld {
    occupancy: Arc<Occupancy>,
    api: Arc<Api>,
    sink: Arc<RecordingSink>,
    reporter: Arc<RecordingHealthReporter>,
    threads: usize,
    synchronized: bool,
    redact: bool,
}

impl QueueWorld {
    fn new() -> Self {
        let occupancy = Arc::new(Occupancy::default());
        let mut api = Api::new().expect("built-ins");
        api.register(&Slow(Arc::clone(&occupancy))).expect("register");
        Self {
            occupancy,
            api: Arc::new(api),
            sink: Arc::new(RecordingSink::default()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            threads: 1,
            synchronized: false,
            redact: false,
        }
    }

    fn builder(&self, channel: QueueChannel) -> DispatcherBuilder {
        let plain = Logger::event(Arc::clone(&self.sink) as Arc<dyn LogSink>);
        let logger = if self.redact {
            plain.with_crypto(Arc::new(Redact))
        } else {
            plain
        };
        Dispatcher::builder(
            DISPATCHER_NAME,
            channel,
            TextParser,
            JsonWrapper,
            Arc::clone(&self.api),
        )
        .threads(self.threads)
        .synchronized(self.synchronized)
        .logger(logger)
        .reporter(Arc::clone(&self.reporter) as Arc<dyn HealthReporter>)
    }

    /// Feeds `requests` to a fresh dispatcher, closes the queue and waits for
    /// the workers to drain it.
    fn run(&self, requests: impl IntoIterator<Item = String>) {
        let (sender, queue) = MpscQueue::channel();
        let channel = QueueChannel::new(Arc::new(queue)).with_wait(Duration::from_millis(50));
        let handle = self.builder(channel).start().expect("start queue dispatcher");
        for request in requests {
            sender.send(request.into_bytes()).expect("enqueue");
        }
        drop(sender);
        handle.join().expect("workers exit once the queue closes");
    }

    fn only_record(&self) -> LogRecord {
        let records = self.sink.records();
        assert_eq!(records.len(), 1, "expected one record: {records:?}");
        records.into_iter().next().expect("one record")
    }
}

fn work_requests(count: usize) -> impl Iterator<Item = String> {
    (0..count).map(|index| format!("work job{index}"))
}

#[fixture]
fn world() -> RefCell<QueueWorld> {
    RefCell::new(QueueWorld::new())
}

#[given("a queue dispatcher with {threads} workers")]
fn given_queue_dispatcher(world: &RefCell<QueueWorld>, threads: usize) {
    world.borrow_mut().threads = threads;
}

#[given("the dispatcher is synchronized")]
fn given_synchronized(world: &RefCell<QueueWorld>) {
    world.borrow_mut().synchronized = true;
}

#[given("the request log redacts values")]
fn given_redacting_log(world: &RefCell<QueueWorld>) {
    world.borrow_mut().redact = true;
}

#[when("the queue receives {count} work requests and closes")]
fn when_queue_receives(world: &RefCell<QueueWorld>, count: usize) {
    world.borrow().run(work_requests(count));
}

#[when("the request {request} is queued and the queue closes")]
fn when_request_queued(world: &RefCell<QueueWorld>, request: String) {
    world.borrow().run([unquote(&request).to_owned()]);
}

#[when("the dispatcher is started and stopped without requests")]
fn when_started_and_stopped(world: &RefCell<QueueWorld>) {
    let world = world.borrow();
    let (_sender, queue) = MpscQueue::channel();
    let channel = QueueChannel::new(Arc::new(queue)).with_wait(Duration::from_millis(50));
    let handle = world.builder(channel).start().expect("start");
    handle.stop().expect("idle workers stop");
}

#[then("{count} work requests were processed")]
fn then_processed(world: &RefCell<QueueWorld>, count: usize) {
    assert_eq!(world.borrow().occupancy.calls.load(Ordering::SeqCst), count);
}

#[then("at most one work request ran at once")]
fn then_one_at_a_time(world: &RefCell<QueueWorld>) {
    assert_eq!(world.borrow().occupancy.peak.load(Ordering::SeqCst), 1);
}

#[then("the request log holds each of the {count} work requests once")]
fn then_each_logged_once(world: &RefCell<QueueWorld>, count: usize) {
    let mut requests = world
        .borrow()
        .sink
        .records()
        .into_iter()
        .map(|record| record.request)
        .collect::<Vec<_>>();
    requests.sort();
    assert_eq!(requests, work_requests(count).collect::<Vec<_>>());
}

#[then("the reporter saw the queue dispatcher start with {threads} workers and stop")]
fn then_lifecycle_reported(world: &RefCell<QueueWorld>, threads: usize) {
    assert_eq!(
        world.borrow().reporter.events(),
        vec![
            HealthEvent::DispatcherStarting {
                name: DISPATCHER_NAME.to_owned(),
                threads,
            },
            HealthEvent::DispatcherStarted {
                name: DISPATCHER_NAME.to_owned(),
                threads,
            },
            HealthEvent::DispatcherStopped(DISPATCHER_NAME.to_owned()),
        ]
    );
}

#[then("the reporter saw the queue dispatcher stop")]
fn then_stop_reported(world: &RefCell<QueueWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(
        events.last(),
        Some(&HealthEvent::DispatcherStopped(DISPATCHER_NAME.to_owned())),
        "{events:?}"
    );
}

#[then("the logged arguments are {arguments}")]
fn then_logged_arguments(world: &RefCell<QueueWorld>, arguments: String) {
    assert_eq!(world.borrow().only_record().arguments, unquote(&arguments));
}

#[then("the logged request is {request}")]
fn then_logged_request(world: &RefCell<QueueWorld>, request: String) {
    assert_eq!(world.borrow().only_record().request, unquote(&request));
}

#[then("the logged response is {response}")]
fn then_logged_response(world: &RefCell<QueueWorld>, response: String) {
    assert_eq!(world.borrow().only_record().response, unquote(&response));
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "A synchronized dispatcher runs one request at a time"
)]
fn synchronized_dispatch(world: RefCell<QueueWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Every queued message is logged once"
)]
fn messages_logged_once(world: RefCell<QueueWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Dispatcher lifecycle events are reported"
)]
fn lifecycle_events(world: RefCell<QueueWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Redacting loggers hide argument values"
)]
fn redacted_logging(world: RefCell<QueueWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/dispatch.feature",
    name = "Idle workers stop on shutdown"
)]
fn idle_shutdown(world: RefCell<QueueWorld>) {
    drop(world);
}
