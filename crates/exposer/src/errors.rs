//! Setup-time errors.
//!
//! Every failure raised while building the registry, a channel, a wrapper or a
//! dispatcher is a [`SetupError`]. These abort startup; nothing here is
//! produced while serving requests.

use std::io;

use exposer_config::ConfigValidationError;
use thiserror::Error;

use crate::channel::ChannelError;

/// Errors raised while constructing the runtime.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A data type key did not match any known data type.
    #[error("unknown data type '{key}'")]
    UnknownDataType {
        /// The unresolved key.
        key: String,
    },
    /// An operation referenced an argument the registry does not know.
    #[error("unknown argument '{name}'")]
    UnknownArgument {
        /// The unresolved argument name.
        name: String,
    },
    /// An operation referenced a label the registry does not know.
    #[error("unknown label '{name}'")]
    UnknownLabel {
        /// The unresolved label name.
        name: String,
    },
    /// A name was registered twice in the same collection.
    #[error("{kind} '{name}' is already registered")]
    Duplicate {
        /// Collection the name clashed in.
        kind: &'static str,
        /// The clashing name.
        name: String,
    },
    /// A name is empty or contains characters reserved by the parsers.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
    /// More arguments were marked required than the operation declares.
    #[error(
        "operation '{operation}' requires {required} argument(s) but declares only {declared}"
    )]
    RequiredExceedsDeclared {
        /// Operation name.
        operation: String,
        /// Declared required count.
        required: usize,
        /// Number of declared arguments.
        declared: usize,
    },
    /// An optional argument has no default value to fall back on.
    #[error("optional argument '{argument}' of operation '{operation}' has no default value")]
    MissingDefault {
        /// Operation name.
        operation: String,
        /// Argument name.
        argument: String,
    },
    /// A default value does not convert to the argument's data type.
    #[error("default value '{value}' of argument '{argument}' is invalid: {reason}")]
    InvalidDefault {
        /// Argument name.
        argument: String,
        /// The offending default.
        value: String,
        /// Conversion failure.
        reason: String,
    },
    /// Registering an instance failed; nothing from the instance was added.
    #[error("failed to register operation '{operation}' of {instance}: {source}")]
    Registration {
        /// Name of the registered instance.
        instance: String,
        /// Operation that failed validation.
        operation: String,
        /// The underlying failure.
        #[source]
        source: Box<SetupError>,
    },
    /// A numeric setting is outside its permitted range.
    #[error("{field} must be between {min} and {max}, was {value}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Supplied value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Malformed scheduled task time of day.
    #[error("Incorrect task time: '{value}'. Needs to be in the format HH:MM.")]
    TaskTime {
        /// The rejected time text.
        value: String,
    },
    /// Scheduled task day of month outside 1..=28.
    #[error("Incorrect day of month: '{day}'. Needs to be min 1 or max 28.")]
    DayOfMonth {
        /// The rejected day.
        day: u32,
    },
    /// Unknown IANA time zone identifier.
    #[error("unknown time zone '{zone}'")]
    TimeZone {
        /// The rejected zone id.
        zone: String,
    },
    /// A redirect rule could not be built.
    #[error("invalid redirect rule: {reason}")]
    Redirect {
        /// Why the rule was rejected.
        reason: String,
    },
    /// The loaded configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
    /// Binding the web channel socket failed.
    #[error("failed to bind web channel on port {port}: {source}")]
    Bind {
        /// Requested port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// A channel refused to produce a clone for an extra worker.
    #[error("cannot start extra workers: {0}")]
    Channel(#[from] ChannelError),
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread '{name}': {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    /// Creates an unknown data type error.
    #[must_use]
    pub fn unknown_data_type(key: impl Into<String>) -> Self {
        Self::UnknownDataType { key: key.into() }
    }

    /// Creates an unknown argument error.
    #[must_use]
    pub fn unknown_argument(name: impl Into<String>) -> Self {
        Self::UnknownArgument { name: name.into() }
    }

    /// Creates an unknown label error.
    #[must_use]
    pub fn unknown_label(name: impl Into<String>) -> Self {
        Self::UnknownLabel { name: name.into() }
    }

    /// Creates a duplicate name error.
    #[must_use]
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
        }
    }

    /// Creates an out-of-range error.
    #[must_use]
    pub fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// Wraps a failure raised while registering one operation of an instance.
    #[must_use]
    pub fn registration(
        instance: impl Into<String>,
        operation: impl Into<String>,
        source: Self,
    ) -> Self {
        Self::Registration {
            instance: instance.into(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Checks `value` against an inclusive range.
    pub(crate) fn ensure_range(
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }
}

/// Rejects names the parsers could not round-trip.
pub(crate) fn validate_name(name: &str) -> Result<(), SetupError> {
    let reason = if name.is_empty() {
        Some("names cannot be empty")
    } else if name.chars().any(|c| c.is_whitespace() || ",=&?\"".contains(c)) {
        Some("names cannot contain whitespace, quotes or any of , = & ?")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SetupError::InvalidName {
            name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
