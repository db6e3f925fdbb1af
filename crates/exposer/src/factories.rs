//! Ready-made dispatcher configurations.
//!
//! Each factory pairs a channel with the parser and wrapper it is normally
//! used with and starts a [`Dispatcher`] from them:
//!
//! - [`WebServerBuilder`]: HTTP channel, [`HttpParser`] and [`WebWrapper`];
//! - [`TaskBuilder`]: one scheduled task, [`TextParser`] and [`CsvWrapper`];
//! - [`command_line_dispatcher`]: standard input and output.

use std::net::TcpListener;
use std::sync::Arc;

use camino::Utf8PathBuf;
use exposer_config::{
    Config, DEFAULT_WEB_ACCESS_LEVEL, DEFAULT_WEB_PORT, DEFAULT_WEB_THREADS, default_web_root,
};

use crate::api::Api;
use crate::channel::{
    Channel, Clock, CommandLineChannel, Redirect, ScheduledTaskChannel, WebChannel, WebChannelOptions,
};
use crate::dispatcher::logging::{JsonLinesSink, Logger, TracingLogSink};
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::errors::SetupError;
use crate::health::HealthReporter;
use crate::parser::{HttpParser, TextParser};
use crate::wrapper::{CsvWrapper, WebWrapper, WebWrapperBuilder};

/// Access level of scheduled task dispatchers.
pub const TASK_ACCESS_LEVEL: i32 = 3;

/// Name prefix of scheduled task dispatchers.
pub const TASK_DISPATCHER_PREFIX: &str = "ScheduledTask_";

/// Builds and starts a web server dispatcher.
pub struct WebServerBuilder {
    api: Arc<Api>,
    port: u16,
    listener: Option<TcpListener>,
    threads: usize,
    access_level: i32,
    synchronized: bool,
    channel: WebChannelOptions,
    wrapper: WebWrapperBuilder,
    loggers: Vec<Logger>,
    reporter: Option<Arc<dyn HealthReporter>>,
}

impl WebServerBuilder {
    /// Web server with default settings serving `web/`.
    #[must_use]
    pub fn new(api: Arc<Api>) -> Self {
        Self {
            api,
            port: DEFAULT_WEB_PORT,
            listener: None,
            threads: DEFAULT_WEB_THREADS,
            access_level: DEFAULT_WEB_ACCESS_LEVEL,
            synchronized: false,
            channel: WebChannelOptions::default(),
            wrapper: WebWrapper::builder(default_web_root()),
            loggers: Vec::new(),
            reporter: None,
        }
    }

    /// Web server configured from a loaded [`Config`].
    #[must_use]
    pub fn from_config(api: Arc<Api>, config: &Config) -> Self {
        let mut builder = Self::new(api)
            .port(config.web_port)
            .threads(config.web_threads)
            .access_level(config.web_access_level)
            .timeout_ms(config.web_timeout_ms)
            .server_name(config.server_name.clone());
        builder.wrapper = WebWrapper::builder(config.web_root.clone()).config(config);
        builder
    }

    /// Port to bind on all interfaces.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Serves an already bound listener instead of binding the port.
    #[must_use]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Worker thread count.
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Access level granted to web requests.
    #[must_use]
    pub const fn access_level(mut self, level: i32) -> Self {
        self.access_level = level;
        self
    }

    /// Serialises request processing.
    #[must_use]
    pub const fn synchronized(mut self, synchronized: bool) -> Self {
        self.synchronized = synchronized;
        self
    }

    /// Per-connection read timeout.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.channel = self.channel.timeout_ms(timeout_ms);
        self
    }

    /// `Server` header of every response.
    #[must_use]
    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        let server_name = server_name.into();
        self.channel = self.channel.server_name(server_name.clone());
        self.wrapper = self.wrapper.server_name(server_name);
        self
    }

    /// Directory files are served from. Resets the wrapper settings applied
    /// before this call.
    #[must_use]
    pub fn web_root(mut self, web_root: impl Into<Utf8PathBuf>) -> Self {
        self.wrapper = WebWrapper::builder(web_root);
        self
    }

    /// `Cache-Control` max age of served files, in seconds.
    #[must_use]
    pub fn browser_cache_max_age(mut self, seconds: u32) -> Self {
        self.wrapper = self.wrapper.browser_cache_max_age(seconds);
        self
    }

    /// Keeps loaded files in memory.
    #[must_use]
    pub fn cache_files(mut self, enabled: bool) -> Self {
        self.wrapper = self.wrapper.cache_files(enabled);
        self
    }

    /// Value substituted for `<!--#echo var="name" -->` in text files.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.wrapper = self.wrapper.variable(name, value);
        self
    }

    /// Header added to every response.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.wrapper = self.wrapper.header(name, value);
        self
    }

    /// Body of 404 responses; `{file}` is replaced by the requested path.
    #[must_use]
    pub fn missing_file_template(mut self, template: impl Into<String>) -> Self {
        self.wrapper = self.wrapper.missing_file_template(template);
        self
    }

    /// Page served for directory requests.
    #[must_use]
    pub fn default_page(mut self, page: impl Into<String>) -> Self {
        self.wrapper = self.wrapper.default_page(page);
        self
    }

    /// Adds a redirect rule.
    #[must_use]
    pub fn redirect(mut self, rule: Redirect) -> Self {
        self.channel = self.channel.redirect(rule);
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
        self.reporter = Some(reporter);
        self
    }

    /// Binds the socket and starts the workers.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range settings, an invalid header, or when the port
    /// cannot be bound.
    pub fn start(self) -> Result<DispatcherHandle, SetupError> {
        let wrapper = self.wrapper.build()?;
        let channel = match self.listener {
            Some(listener) => WebChannel::with_listener(listener, self.channel)?,
            None => WebChannel::bind(self.port, self.channel)?,
        };
        let port = channel.local_addr().map_or(self.port, |addr| addr.port());
        let name = format!("WebServer_{port}");
        let mut builder = Dispatcher::builder(name, channel, HttpParser, wrapper, self.api)
            .threads(self.threads)
            .access_level(self.access_level)
            .synchronized(self.synchronized);
        for logger in self.loggers {
            builder = builder.logger(logger);
        }
        if let Some(reporter) = self.reporter {
            builder = builder.reporter(reporter);
        }
        builder.start()
    }
}

/// Builds and starts a dispatcher for one scheduled task.
///
/// Unless loggers are added explicitly, every run is written as a JSON line
/// to standard output and failures are also reported through `tracing`.
pub struct TaskBuilder {
    api: Arc<Api>,
    channel: ScheduledTaskChannel,
    loggers: Vec<Logger>,
    reporter: Option<Arc<dyn HealthReporter>>,
}

impl TaskBuilder {
    /// Task sending `request` every `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Fails when `minutes` is outside `1..=1440`.
    pub fn minute(
        api: Arc<Api>,
        name: impl Into<String>,
        request: impl Into<String>,
        minutes: u32,
    ) -> Result<Self, SetupError> {
        Ok(Self::from_channel(
            api,
            ScheduledTaskChannel::minutes(name, request, minutes)?,
        ))
    }

    /// Task sending `request` daily at `time_of_day` (`HH:MM`) in `zone`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed time or an unknown zone.
    pub fn daily(
        api: Arc<Api>,
        name: impl Into<String>,
        request: impl Into<String>,
        time_of_day: &str,
        zone: &str,
    ) -> Result<Self, SetupError> {
        Ok(Self::from_channel(
            api,
            ScheduledTaskChannel::daily(name, request, time_of_day, zone)?,
        ))
    }

    /// Task sending `request` monthly on `day_of_month` at `time_of_day`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed time, a day outside `1..=28` or an unknown zone.
    pub fn monthly(
        api: Arc<Api>,
        name: impl Into<String>,
        request: impl Into<String>,
        time_of_day: &str,
        day_of_month: u32,
        zone: &str,
    ) -> Result<Self, SetupError> {
        Ok(Self::from_channel(
            api,
            ScheduledTaskChannel::monthly(name, request, time_of_day, day_of_month, zone)?,
        ))
    }

    const fn from_channel(api: Arc<Api>, channel: ScheduledTaskChannel) -> Self {
        Self {
            api,
            channel,
            loggers: Vec::new(),
            reporter: None,
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.channel = self.channel.with_clock(clock);
        self
    }

    /// Adds a request logger in place of the default ones.
    #[must_use]
    pub fn logger(mut self, logger: Logger) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Starts the single worker.
    ///
    /// # Errors
    ///
    /// Fails when the worker thread cannot be spawned.
    pub fn start(self) -> Result<DispatcherHandle, SetupError> {
        let name = format!("{TASK_DISPATCHER_PREFIX}{}", self.channel.name());
        let loggers = if self.loggers.is_empty() {
            vec![
                Logger::event(Arc::new(JsonLinesSink::stdout())),
                Logger::error(Arc::new(TracingLogSink)),
            ]
        } else {
            self.loggers
        };
        let mut builder = Dispatcher::builder(name, self.channel, TextParser, CsvWrapper, self.api)
            .access_level(TASK_ACCESS_LEVEL);
        for logger in loggers {
            builder = builder.logger(logger);
        }
        if let Some(reporter) = self.reporter {
            builder = builder.reporter(reporter);
        }
        builder.start()
    }
}

/// Starts a dispatcher reading one request per line from standard input.
///
/// # Errors
///
/// Fails when the worker thread cannot be spawned.
pub fn command_line_dispatcher(
    api: Arc<Api>,
    access_level: i32,
    reporter: Arc<dyn HealthReporter>,
) -> Result<DispatcherHandle, SetupError> {
    Dispatcher::builder(
        "CommandLine",
        CommandLineChannel::stdio(),
        TextParser,
        CsvWrapper,
        api,
    )
    .access_level(access_level)
    .logger(Logger::error(Arc::new(TracingLogSink)))
    .reporter(reporter)
    .start()
}
