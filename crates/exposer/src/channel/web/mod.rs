//! Raw HTTP channel over a shared TCP listener.

mod connection;
mod redirect;

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use exposer_config::{DEFAULT_SERVER_NAME, DEFAULT_WEB_TIMEOUT_MS, WEB_TIMEOUT_MS_RANGE};
use serde_json::json;
use tracing::{debug, info, warn};

pub use self::connection::MAX_REQUEST_BYTES;
pub use self::redirect::Redirect;
use self::connection::{ReadFailure, read_request};
use super::{CHANNEL_TARGET, Channel, ChannelError, StopSignal};
use crate::errors::SetupError;
use crate::http::{HttpRequest, plain_text, redirect};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const GHOST_PATH: &str = "/ghost";

/// Body of the reply to liveness checks.
pub const GHOST_REPLY: &str = "Hi Ghost!";

/// Settings of a [`WebChannel`].
#[derive(Debug, Clone)]
pub struct WebChannelOptions {
    timeout_ms: u64,
    server_name: String,
    redirects: Vec<Redirect>,
}

impl Default for WebChannelOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WEB_TIMEOUT_MS,
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            redirects: Vec::new(),
        }
    }
}

impl WebChannelOptions {
    /// Read timeout per connection, validated when the channel is built.
    #[must_use]
    pub const fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// `Server` header of direct responses.
    #[must_use]
    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    /// Adds a redirect rule; rules are tried in insertion order.
    #[must_use]
    pub fn redirect(mut self, rule: Redirect) -> Self {
        self.redirects.push(rule);
        self
    }

    /// Adds several redirect rules.
    #[must_use]
    pub fn redirects(mut self, rules: impl IntoIterator<Item = Redirect>) -> Self {
        self.redirects.extend(rules);
        self
    }
}

#[derive(Debug)]
struct SharedListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    options: WebChannelOptions,
    stop: StopSignal,
}

#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

/// Channel reading one HTTP request per accepted connection.
///
/// Every clone accepts from the same listening socket; the OS hands each
/// connection to exactly one of them. Ghost requests and redirect matches are
/// answered without involving the worker.
#[derive(Debug)]
pub struct WebChannel {
    shared: Arc<SharedListener>,
    connection: Option<Connection>,
    read_time: Duration,
    write_time: Duration,
}

impl WebChannel {
    /// Binds `0.0.0.0:<port>`.
    ///
    /// # Errors
    ///
    /// Fails when the port or timeout is out of range or the bind fails.
    pub fn bind(port: u16, options: WebChannelOptions) -> Result<Self, SetupError> {
        SetupError::ensure_range("web port", i64::from(port), 1, 65_535)?;
        let listener =
            TcpListener::bind(("0.0.0.0", port)).map_err(|source| SetupError::Bind { port, source })?;
        Self::with_listener(listener, options)
    }

    /// Serves an already bound listener.
    ///
    /// # Errors
    ///
    /// Fails when the timeout is out of range or the socket cannot be
    /// switched to non-blocking mode.
    pub fn with_listener(listener: TcpListener, options: WebChannelOptions) -> Result<Self, SetupError> {
        SetupError::ensure_range(
            "web timeout",
            i64::try_from(options.timeout_ms).unwrap_or(i64::MAX),
            i64::try_from(*WEB_TIMEOUT_MS_RANGE.start()).unwrap_or(0),
            i64::try_from(*WEB_TIMEOUT_MS_RANGE.end()).unwrap_or(i64::MAX),
        )?;
        let local_addr = listener.local_addr().map_err(|source| SetupError::Bind {
            port: 0,
            source,
        })?;
        listener.set_nonblocking(true).map_err(|source| SetupError::Bind {
            port: local_addr.port(),
            source,
        })?;
        info!(
            target: CHANNEL_TARGET,
            address = %local_addr,
            timeout_ms = options.timeout_ms,
            redirects = options.redirects.len(),
            "web channel listening"
        );
        Ok(Self {
            shared: Arc::new(SharedListener {
                listener,
                local_addr,
                options,
                stop: StopSignal::new(),
            }),
            connection: None,
            read_time: Duration::ZERO,
            write_time: Duration::ZERO,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.shared.options.timeout_ms)
    }

    fn accept(&self) -> Option<Connection> {
        let mut last_error = None::<io::ErrorKind>;
        while !self.shared.stop.is_raised() {
            match self.shared.listener.accept() {
                Ok((stream, peer)) => match self.prepare(&stream) {
                    Ok(()) => return Some(Connection { stream, peer }),
                    Err(error) => warn!(
                        target: CHANNEL_TARGET,
                        peer = %peer,
                        error = %error,
                        "failed to configure accepted connection"
                    ),
                },
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(
                            target: CHANNEL_TARGET,
                            error = %error,
                            "web accept error"
                        );
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        None
    }

    fn prepare(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.timeout()))?;
        stream.set_nodelay(true)
    }

    fn direct_response(&self, buffer: &[u8]) -> Option<Vec<u8>> {
        let server = &self.shared.options.server_name;
        if buffer.is_empty() {
            return Some(plain_text(server, GHOST_REPLY));
        }
        let request = HttpRequest::parse(buffer).ok()?;
        if request.path() == GHOST_PATH {
            return Some(plain_text(server, GHOST_REPLY));
        }
        self.shared
            .options
            .redirects
            .iter()
            .find_map(|rule| rule.location(&request))
            .map(|location| {
                debug!(
                    target: CHANNEL_TARGET,
                    target_url = %request.target(),
                    location = %location,
                    "redirecting request"
                );
                redirect(server, &location)
            })
    }
}

impl Channel for WebChannel {
    fn get_request(&mut self, buffer: &mut Vec<u8>) -> Result<bool, ChannelError> {
        self.connection = None;
        loop {
            buffer.clear();
            let Some(mut connection) = self.accept() else {
                return Ok(false);
            };
            let started = Instant::now();
            let outcome = read_request(&mut connection.stream, buffer);
            self.read_time = started.elapsed();
            match outcome {
                Ok(()) => {}
                Err(ReadFailure::TimedOut) => {
                    return Err(ChannelError::ReadTimeout {
                        peer: connection.peer.to_string(),
                        timeout_ms: self.shared.options.timeout_ms,
                    });
                }
                Err(ReadFailure::TooLarge) => {
                    return Err(ChannelError::RequestTooLarge {
                        max_bytes: MAX_REQUEST_BYTES,
                    });
                }
                Err(ReadFailure::Io(source)) => {
                    return Err(ChannelError::io("reading request", source));
                }
            }
            if let Some(response) = self.direct_response(buffer) {
                if let Err(error) = send_and_close(&mut connection.stream, &response) {
                    debug!(
                        target: CHANNEL_TARGET,
                        peer = %connection.peer,
                        error = %error,
                        "direct response not delivered"
                    );
                }
                continue;
            }
            self.connection = Some(connection);
            return Ok(true);
        }
    }

    fn write_response(&mut self, response: &[u8]) -> Result<(), ChannelError> {
        let Some(mut connection) = self.connection.take() else {
            return Err(ChannelError::NoActiveConnection);
        };
        let started = Instant::now();
        let outcome = send_and_close(&mut connection.stream, response);
        self.write_time = started.elapsed();
        match outcome {
            Ok(()) => Ok(()),
            Err(error) if peer_went_away(&error) => {
                debug!(
                    target: CHANNEL_TARGET,
                    peer = %connection.peer,
                    error = %error,
                    "peer closed before the response was written"
                );
                Ok(())
            }
            Err(error) => Err(ChannelError::io("writing response", error)),
        }
    }

    fn stop_signal(&self) -> StopSignal {
        self.shared.stop.clone()
    }

    fn try_clone(&self) -> Result<Box<dyn Channel>, ChannelError> {
        Ok(Box::new(Self {
            shared: Arc::clone(&self.shared),
            connection: None,
            read_time: Duration::ZERO,
            write_time: Duration::ZERO,
        }))
    }

    fn request_read_time(&self) -> Duration {
        self.read_time
    }

    fn response_write_time(&self) -> Duration {
        self.write_time
    }

    fn sender_info(&self) -> String {
        self.connection
            .as_ref()
            .map(|connection| connection.peer.to_string())
            .unwrap_or_default()
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "kind": "web",
            "address": self.shared.local_addr.to_string(),
            "timeout_ms": self.shared.options.timeout_ms,
            "server_name": self.shared.options.server_name,
            "redirects": self.shared.options.redirects.len(),
            "stopped": self.shared.stop.is_raised(),
        })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.shared.local_addr)
    }
}

fn send_and_close(stream: &mut TcpStream, response: &[u8]) -> io::Result<()> {
    stream.write_all(response)?;
    stream.flush()?;
    if let Err(error) = stream.shutdown(Shutdown::Both) {
        if error.kind() != io::ErrorKind::NotConnected {
            return Err(error);
        }
    }
    Ok(())
}

fn peer_went_away(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}
