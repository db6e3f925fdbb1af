//! Per-call errors raised while resolving and invoking operations.
//!
//! A [`CallError`] never stops a worker: the dispatcher wraps it into an error
//! response, logs it as an error entry and moves on to the next request.

use std::fmt;

use thiserror::Error;

use super::data_type::DataType;
use super::failure::OperationFailure;

/// Recoverable failures of a single call.
#[derive(Debug, Error)]
pub enum CallError {
    /// Too few or too many arguments were supplied.
    #[error("{0}")]
    ArgumentCount(ArgumentCountError),
    /// A by-name call used a name the operation does not declare.
    #[error("Unknown argument '{argument}' in call to '{operation}'.")]
    UnknownArgument {
        /// Operation name.
        operation: String,
        /// The unknown argument name.
        argument: String,
    },
    /// A value failed conversion to its argument's data type.
    #[error("Invalid value '{value}' for argument '{argument}' of type {data_type}: {reason}")]
    InvalidArgumentValue {
        /// Argument name.
        argument: String,
        /// The rejected text.
        value: String,
        /// Target data type.
        data_type: DataType,
        /// Conversion failure.
        reason: String,
    },
    /// The dispatcher does not grant enough privilege for the operation.
    #[error(
        "The operation '{operation}' has access level {required}. The dispatcher used only has \
         access to level {granted} operations and below."
    )]
    InsufficientAccessLevel {
        /// Operation name.
        operation: String,
        /// Level the operation requires.
        required: i32,
        /// Level the dispatcher grants.
        granted: i32,
    },
    /// Neither an operation nor an alias has the requested name.
    #[error("No operation named '{name}'.")]
    UnknownOperation {
        /// The requested name.
        name: String,
    },
    /// A by-name call left out a required argument.
    #[error("Required argument '{argument}' is missing in call to '{operation}'.")]
    MissingArgument {
        /// Operation name.
        operation: String,
        /// The omitted argument.
        argument: String,
    },
    /// The request text could not be parsed.
    #[error("Could not parse request: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
    /// The operation itself reported a failure.
    #[error("{0}")]
    Invocation(Box<InvocationError>),
    /// The operation could not be run: a binding mismatch or a panic.
    #[error("Operation '{operation}' could not be run: {message}")]
    Runtime {
        /// Operation name.
        operation: String,
        /// What went wrong.
        message: String,
    },
    /// A file was requested through a wrapper that cannot serve files.
    #[error("{wrapper} cannot serve file requests.")]
    UnsupportedFileRequest {
        /// Name of the wrapper.
        wrapper: &'static str,
    },
}

impl CallError {
    /// Creates an unknown operation error.
    #[must_use]
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    /// Creates an unknown argument error.
    #[must_use]
    pub fn unknown_argument(operation: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnknownArgument {
            operation: operation.into(),
            argument: argument.into(),
        }
    }

    /// Creates an invalid argument value error.
    #[must_use]
    pub fn invalid_argument_value(
        argument: impl Into<String>,
        value: impl Into<String>,
        data_type: DataType,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgumentValue {
            argument: argument.into(),
            value: value.into(),
            data_type,
            reason: reason.into(),
        }
    }

    /// Creates an insufficient access level error.
    #[must_use]
    pub fn insufficient_access_level(
        operation: impl Into<String>,
        required: i32,
        granted: i32,
    ) -> Self {
        Self::InsufficientAccessLevel {
            operation: operation.into(),
            required,
            granted,
        }
    }

    /// Creates a missing argument error.
    #[must_use]
    pub fn missing_argument(operation: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::MissingArgument {
            operation: operation.into(),
            argument: argument.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a runtime error.
    #[must_use]
    pub fn runtime(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Runtime {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Wraps a failure reported by an operation.
    #[must_use]
    pub fn invocation(operation: impl Into<String>, failure: OperationFailure) -> Self {
        Self::Invocation(Box::new(InvocationError::new(operation.into(), failure)))
    }

    /// Attaches the argument name to a conversion failure.
    #[must_use]
    pub fn for_argument(self, name: &str) -> Self {
        match self {
            Self::InvalidArgumentValue {
                value,
                data_type,
                reason,
                ..
            } => Self::InvalidArgumentValue {
                argument: name.to_owned(),
                value,
                data_type,
                reason,
            },
            other => other,
        }
    }

    /// Stable identifier of the variant, used in log records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ArgumentCount(_) => "ArgumentCount",
            Self::UnknownArgument { .. } => "UnknownArgument",
            Self::InvalidArgumentValue { .. } => "InvalidArgumentValue",
            Self::InsufficientAccessLevel { .. } => "InsufficientAccessLevel",
            Self::UnknownOperation { .. } => "UnknownOperation",
            Self::MissingArgument { .. } => "MissingArgument",
            Self::Parse { .. } => "Parse",
            Self::Invocation(_) => "Invocation",
            Self::Runtime { .. } => "Runtime",
            Self::UnsupportedFileRequest { .. } => "UnsupportedFileRequest",
        }
    }

    /// Renders the error as ordered key/value pairs for wrappers.
    ///
    /// The first pair is always `message`. Invocation errors add the
    /// operation, the source location and every property the failure carries.
    #[must_use]
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("message".to_owned(), self.to_string())];
        if let Self::Invocation(error) = self {
            fields.push(("operation".to_owned(), error.operation.clone()));
            fields.push(("location".to_owned(), error.location.clone()));
            fields.extend(error.properties.iter().cloned());
        }
        fields
    }
}

/// Arity violation. Either or both fragments may be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentCountError {
    operation: String,
    supplied: usize,
    min: usize,
    max: usize,
}

impl ArgumentCountError {
    /// Checks `supplied` against `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns the violation when `supplied` lies outside the bounds.
    pub fn check(operation: &str, supplied: usize, min: usize, max: usize) -> Result<(), Self> {
        let error = Self {
            operation: operation.to_owned(),
            supplied,
            min,
            max,
        };
        if error.too_few() || error.too_many() {
            Err(error)
        } else {
            Ok(())
        }
    }

    /// Number of values supplied by the caller.
    #[must_use]
    pub const fn supplied(&self) -> usize {
        self.supplied
    }

    /// Inclusive bounds `[required, declared]`.
    #[must_use]
    pub const fn bounds(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    /// Fewer values than required were supplied.
    #[must_use]
    pub const fn too_few(&self) -> bool {
        self.supplied < self.min
    }

    /// More values than declared were supplied.
    #[must_use]
    pub const fn too_many(&self) -> bool {
        self.supplied > self.max
    }
}

impl fmt::Display for ArgumentCountError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            operation,
            supplied,
            min,
            max,
        } = self;
        let mut fragments = Vec::with_capacity(2);
        if self.too_few() {
            fragments.push(format!(
                "Too few arguments. Was {supplied} and operation '{operation}' requires a \
                 minimum of {min} argument(s), bounds [{min}, {max}]."
            ));
        }
        if self.too_many() {
            fragments.push(format!(
                "Too many arguments. Was {supplied} and operation '{operation}' takes a \
                 maximum of {max} argument(s), bounds [{min}, {max}]."
            ));
        }
        formatter.write_str(&fragments.join(" "))
    }
}

/// A failure raised by an operation, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationError {
    operation: String,
    message: String,
    location: String,
    properties: Vec<(String, String)>,
}

impl InvocationError {
    fn new(operation: String, failure: OperationFailure) -> Self {
        let location = failure.location().to_string();
        let (message, properties) = failure.into_parts();
        Self {
            operation,
            message,
            location,
            properties,
        }
    }

    /// Operation that raised the failure.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Message of the underlying failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line:column` where the failure was created.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Structured properties carried by the failure.
    #[must_use]
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}
