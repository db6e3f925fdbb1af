//! Bootstrap and process lifecycle behaviour.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{
    FailingConfigLoader, HealthEvent, InvalidConfigLoader, RecordingHealthReporter,
    TestConfigLoader, body_of, get, unquote,
};
use crate::bootstrap::{BootstrapError, ConfigLoader, Runtime, bootstrap_with};
use crate::builtins::builtin_api;
use crate::health::HealthReporter;
use crate::process::{LaunchError, ShutdownError, ShutdownSignal, run_runtime_with};

type StepResult = Result<(), String>;

struct ImmediateShutdown;

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        Ok(())
    }
}

#[derive(Default)]
struct RuntimeWorld {
    loader: Option<Box<dyn ConfigLoader>>,
    port: Option<u16>,
    reporter: Arc<RecordingHealthReporter>,
    runtime: Option<Runtime>,
    bootstrap_error: Option<BootstrapError>,
    run_outcome: Option<Result<(), LaunchError>>,
}

impl RuntimeWorld {
    fn use_loader(&mut self, loader: impl ConfigLoader + 'static) {
        self.loader = Some(Box::new(loader));
    }

    fn use_test_loader(&mut self) {
        let loader = TestConfigLoader::new();
        self.port = Some(loader.port());
        self.use_loader(loader);
    }

    fn loader(&self) -> &dyn ConfigLoader {
        self.loader.as_deref().expect("loader chosen")
    }

    fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter) as Arc<dyn HealthReporter>
    }

    fn bootstrap(&mut self) {
        let api = Arc::new(builtin_api().expect("built-ins"));
        match bootstrap_with(self.loader(), self.reporter(), api) {
            Ok(runtime) => self.runtime = Some(runtime),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    fn run_until_shutdown(&mut self) {
        let api = Arc::new(builtin_api().expect("built-ins"));
        let outcome = run_runtime_with(self.loader(), self.reporter(), &ImmediateShutdown, api);
        self.run_outcome = Some(outcome);
    }

    fn addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port.expect("test loader chosen")))
    }

    fn web_server_name(&self) -> String {
        format!("WebServer_{}", self.port.expect("test loader chosen"))
    }
}

impl Drop for RuntimeWorld {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let outcome = runtime.stop();
            debug_assert!(outcome.is_ok(), "runtime failed to stop: {outcome:?}");
        }
    }
}

#[fixture]
fn world() -> RefCell<RuntimeWorld> {
    RefCell::new(RuntimeWorld::default())
}

#[given("a configuration with a free port and a web root")]
fn given_test_configuration(world: &RefCell<RuntimeWorld>) {
    world.borrow_mut().use_test_loader();
}

#[given("a configuration with a malformed port flag")]
fn given_malformed_configuration(world: &RefCell<RuntimeWorld>) {
    world.borrow_mut().use_loader(FailingConfigLoader);
}

#[given("a configuration with zero web threads")]
fn given_invalid_configuration(world: &RefCell<RuntimeWorld>) {
    world.borrow_mut().use_loader(InvalidConfigLoader);
}

#[when("the runtime bootstraps")]
fn when_bootstraps(world: &RefCell<RuntimeWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("the runtime stops")]
fn when_runtime_stops(world: &RefCell<RuntimeWorld>) {
    let runtime = world.borrow_mut().runtime.take().expect("runtime running");
    runtime.stop().expect("stop runtime");
}

#[when("the runtime runs until an immediate shutdown")]
fn when_runs_until_shutdown(world: &RefCell<RuntimeWorld>) {
    world.borrow_mut().run_until_shutdown();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<RuntimeWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error.is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error
    );
    let runtime = world.runtime.as_ref().expect("runtime started");
    assert!(runtime.command_line().is_none());
}

#[then("GET {target} answers {body}")]
fn then_get_answers(world: &RefCell<RuntimeWorld>, target: String, body: String) {
    let addr = world.borrow().addr();
    let response = get(addr, unquote(&target));
    assert_eq!(body_of(&response), unquote(&body), "{response}");
}

#[then("bootstrap fails with a configuration error")]
fn then_configuration_error(world: &RefCell<RuntimeWorld>) -> StepResult {
    match &world.borrow().bootstrap_error {
        Some(BootstrapError::Configuration { .. }) => Ok(()),
        other => Err(format!("expected a configuration error, got {other:?}")),
    }
}

#[then("bootstrap fails with a validation error")]
fn then_validation_error(world: &RefCell<RuntimeWorld>) -> StepResult {
    match &world.borrow().bootstrap_error {
        Some(BootstrapError::Validation { .. }) => Ok(()),
        other => Err(format!("expected a validation error, got {other:?}")),
    }
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<RuntimeWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        matches!(
            events.as_slice(),
            [HealthEvent::BootstrapStarting, HealthEvent::BootstrapFailed(_)]
        ),
        "unexpected events: {events:?}"
    );
}

#[then("the reporter recorded the web server lifecycle")]
fn then_reporter_lifecycle(world: &RefCell<RuntimeWorld>) {
    let world = world.borrow();
    let name = world.web_server_name();
    assert_eq!(
        world.reporter.events(),
        vec![
            HealthEvent::BootstrapStarting,
            HealthEvent::DispatcherStarting {
                name: name.clone(),
                threads: 2,
            },
            HealthEvent::DispatcherStarted {
                name: name.clone(),
                threads: 2,
            },
            HealthEvent::BootstrapSucceeded,
            HealthEvent::DispatcherStopped(name),
        ]
    );
}

#[then("the runtime exited cleanly")]
fn then_exited_cleanly(world: &RefCell<RuntimeWorld>) {
    let world = world.borrow();
    let outcome = world.run_outcome.as_ref().expect("runtime ran");
    assert!(outcome.is_ok(), "runtime failed: {outcome:?}");
}

#[then("the last reported event is a dispatcher stop")]
fn then_last_event_is_stop(world: &RefCell<RuntimeWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        matches!(events.last(), Some(HealthEvent::DispatcherStopped(_))),
        "unexpected events: {events:?}"
    );
}

#[scenario(
    path = "tests/features/runtime_bootstrap.feature",
    name = "Bootstrap serves the built-in operations"
)]
fn bootstrap_serves_builtins(world: RefCell<RuntimeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/runtime_bootstrap.feature",
    name = "Malformed configuration is reported"
)]
fn malformed_configuration(world: RefCell<RuntimeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/runtime_bootstrap.feature",
    name = "Out of range configuration is rejected"
)]
fn out_of_range_configuration(world: RefCell<RuntimeWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/runtime_bootstrap.feature",
    name = "The runtime stops after the shutdown signal"
)]
fn stops_after_shutdown_signal(world: RefCell<RuntimeWorld>) {
    drop(world);
}
