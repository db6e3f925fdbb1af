//! Wrappers turn operation results, errors and files into channel bytes.

mod csv;
mod json;
mod web;

pub use self::csv::CsvWrapper;
pub use self::json::JsonWrapper;
pub use self::web::{DEFAULT_PAGE, MISSING_FILE_TEMPLATE, WebWrapper, WebWrapperBuilder};

use crate::api::{CallError, Value};
use crate::context::RequestContext;

/// Formats responses for one channel kind.
pub trait Wrapper: Send + Sync {
    /// Formats the value returned by an operation.
    fn wrap_response(&self, value: &Value, context: &RequestContext) -> Vec<u8>;

    /// Formats a failed call from its ordered key/value fields.
    fn wrap_error(&self, fields: &[(String, String)], context: &RequestContext) -> Vec<u8>;

    /// Serves the file at `path`, relative to the wrapper's root.
    ///
    /// # Errors
    ///
    /// Wrappers without a file store return
    /// [`CallError::UnsupportedFileRequest`].
    fn wrap_file(&self, path: &str, context: &RequestContext) -> Result<Vec<u8>, CallError>;
}
