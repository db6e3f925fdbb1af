//! Request parsers.
//!
//! A parser turns the raw bytes a channel produced into a [`Request`]. It does
//! not convert argument values; that happens per argument during invocation.

mod http;
mod splitter;
mod text;

use std::collections::BTreeMap;

pub use self::http::{API_PREFIX, HttpParser};
pub use self::splitter::split_arguments;
pub use self::text::TextParser;
use crate::api::CallError;

/// Converts raw request bytes into a [`Request`].
pub trait Parser: Send + Sync {
    /// Parses one request.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Parse`] for malformed input.
    fn parse(&self, raw: &[u8]) -> Result<Request, CallError>;
}

/// A parsed request: either an operation call or a file request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    operation: String,
    values: Vec<String>,
    names: Vec<String>,
    file: Option<String>,
    cookies: BTreeMap<String, String>,
}

impl Request {
    /// A positional call.
    #[must_use]
    pub fn call(operation: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            operation: operation.into(),
            values,
            ..Self::default()
        }
    }

    /// A call with named arguments; `names` is parallel to `values`.
    #[must_use]
    pub fn named(operation: impl Into<String>, names: Vec<String>, values: Vec<String>) -> Self {
        Self {
            operation: operation.into(),
            values,
            names,
            ..Self::default()
        }
    }

    /// A request for a file relative to the web root.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Attaches the cookies sent with the request.
    #[must_use]
    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Name of the called operation, empty for file requests.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Argument values as text.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Argument names, empty for positional calls.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Requested file, if this is a file request.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Cookies sent with the request.
    #[must_use]
    pub const fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub(crate) fn take_cookies(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.cookies)
    }
}
