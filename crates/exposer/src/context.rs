//! Per-request state handed to operations and wrappers.

use std::collections::BTreeMap;

use crate::http::Cookie;

/// State owned by one request/response cycle.
///
/// A worker creates a fresh context for every request; operations read the
/// incoming cookies and queue outgoing ones, and the wrapper turns the
/// outgoing cookies into `Set-Cookie` headers. The context is dropped once
/// the response is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    incoming: BTreeMap<String, String>,
    outgoing: Vec<Cookie>,
    sender: String,
    access_level: i32,
}

impl RequestContext {
    /// Creates a context for a request from `sender`.
    #[must_use]
    pub fn new(sender: impl Into<String>, access_level: i32) -> Self {
        Self {
            sender: sender.into(),
            access_level,
            ..Self::default()
        }
    }

    /// Replaces the cookies received with the request.
    pub fn set_incoming_cookies(&mut self, cookies: BTreeMap<String, String>) {
        self.incoming = cookies;
    }

    /// Value of a cookie sent by the client.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.incoming.get(name).map(String::as_str)
    }

    /// All cookies sent by the client.
    #[must_use]
    pub const fn incoming_cookies(&self) -> &BTreeMap<String, String> {
        &self.incoming
    }

    /// Queues a cookie for the response.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.outgoing.push(cookie);
    }

    /// Cookies queued for the response.
    #[must_use]
    pub fn outgoing_cookies(&self) -> &[Cookie] {
        &self.outgoing
    }

    /// Description of the caller, e.g. a peer address.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Access level the dispatcher grants this request.
    #[must_use]
    pub const fn access_level(&self) -> i32 {
        self.access_level
    }
}
