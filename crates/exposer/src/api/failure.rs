//! Failures raised by operation handlers.

use std::error::Error;
use std::fmt;
use std::panic::Location;

/// Errors that carry structured key/value details for the caller.
///
/// Implement this for domain errors whose details should reach the error
/// response and the log, then convert with
/// [`OperationFailure::with_properties_of`].
pub trait FailureProperties {
    /// Key/value pairs describing the failure.
    fn properties(&self) -> Vec<(String, String)>;
}

/// A failure returned by an operation handler.
///
/// Any [`std::error::Error`] converts into a failure through `?`; the location
/// of the conversion is recorded so error responses can point at the failing
/// line.
#[derive(Debug, Clone)]
pub struct OperationFailure {
    message: String,
    properties: Vec<(String, String)>,
    location: &'static Location<'static>,
    binding: bool,
}

impl OperationFailure {
    /// Creates a failure with a message.
    #[track_caller]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            properties: Vec::new(),
            location: Location::caller(),
            binding: false,
        }
    }

    /// Creates a failure from an error exposing [`FailureProperties`].
    #[track_caller]
    #[must_use]
    pub fn with_properties_of<E>(error: &E) -> Self
    where
        E: Error + FailureProperties,
    {
        Self {
            properties: error.properties(),
            ..Self::new(error.to_string())
        }
    }

    /// Signals that handler code read its arguments with the wrong shape.
    #[track_caller]
    pub(crate) fn binding(message: impl Into<String>) -> Self {
        Self {
            binding: true,
            ..Self::new(message)
        }
    }

    /// Attaches a key/value property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached properties, in insertion order.
    #[must_use]
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Where the failure was created.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub(crate) const fn is_binding(&self) -> bool {
        self.binding
    }

    pub(crate) fn into_parts(self) -> (String, Vec<(String, String)>) {
        (self.message, self.properties)
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl<E> From<E> for OperationFailure
where
    E: Error,
{
    #[track_caller]
    fn from(error: E) -> Self {
        Self::new(error.to_string())
    }
}
