//! Operation descriptors and the invocation contract.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::json;

use super::argument::Argument;
use super::call::Call;
use super::data_type::DataType;
use super::errors::{ArgumentCountError, CallError};
use super::failure::OperationFailure;
use super::registry::Api;
use super::value::Value;
use crate::context::RequestContext;
use crate::errors::SetupError;

/// Callable bound to an operation.
pub type Handler = Arc<dyn Fn(&mut Call<'_>) -> Result<Value, OperationFailure> + Send + Sync>;

/// A registered, callable operation.
pub struct Operation {
    name: String,
    description: String,
    arguments: Vec<Arc<Argument>>,
    required: usize,
    return_type: DataType,
    access_level: i32,
    auth_required: bool,
    aliases: BTreeSet<String>,
    labels: BTreeSet<String>,
    handler: Handler,
}

/// Resolved parts of an operation, validated by [`Operation::new`].
pub(crate) struct OperationParts {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) arguments: Vec<Arc<Argument>>,
    pub(crate) required: usize,
    pub(crate) return_type: DataType,
    pub(crate) access_level: i32,
    pub(crate) auth_required: bool,
    pub(crate) aliases: BTreeSet<String>,
    pub(crate) labels: BTreeSet<String>,
    pub(crate) handler: Handler,
}

impl Operation {
    pub(crate) fn new(parts: OperationParts) -> Result<Self, SetupError> {
        if parts.required > parts.arguments.len() {
            return Err(SetupError::RequiredExceedsDeclared {
                operation: parts.name,
                required: parts.required,
                declared: parts.arguments.len(),
            });
        }
        if let Some(argument) = parts
            .arguments
            .iter()
            .skip(parts.required)
            .find(|argument| argument.default_value().is_none())
        {
            return Err(SetupError::MissingDefault {
                operation: parts.name,
                argument: argument.name().to_owned(),
            });
        }
        Ok(Self {
            name: parts.name,
            description: parts.description,
            arguments: parts.arguments,
            required: parts.required,
            return_type: parts.return_type,
            access_level: parts.access_level,
            auth_required: parts.auth_required,
            aliases: parts.aliases,
            labels: parts.labels,
            handler: parts.handler,
        })
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared arguments, in positional order.
    #[must_use]
    pub fn arguments(&self) -> &[Arc<Argument>] {
        &self.arguments
    }

    /// Number of leading arguments a caller must supply.
    #[must_use]
    pub const fn required_argument_count(&self) -> usize {
        self.required
    }

    /// Declared return type.
    #[must_use]
    pub const fn return_type(&self) -> DataType {
        self.return_type
    }

    /// Minimum access level a dispatcher must grant.
    #[must_use]
    pub const fn access_level(&self) -> i32 {
        self.access_level
    }

    /// Whether callers must be authenticated.
    #[must_use]
    pub const fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// Extra names resolving to this operation.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    /// Labels grouping this operation.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Position of the argument called `name`.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.arguments
            .iter()
            .position(|argument| argument.name() == name)
    }

    /// Validates, converts and applies `values`, then runs the handler.
    ///
    /// `names` is either empty (positional call) or parallel to `values`.
    ///
    /// # Errors
    ///
    /// Returns the first failing step: arity, access level, conversion,
    /// missing arguments, then whatever the handler itself reports.
    pub fn invoke(
        &self,
        api: &Api,
        values: &[String],
        names: &[String],
        access_level: i32,
        context: &mut RequestContext,
    ) -> Result<Value, CallError> {
        ArgumentCountError::check(&self.name, values.len(), self.required, self.arguments.len())
            .map_err(CallError::ArgumentCount)?;
        if access_level < self.access_level {
            return Err(CallError::insufficient_access_level(
                &self.name,
                self.access_level,
                access_level,
            ));
        }
        let supplied = self.cast(values, names)?;
        let arguments = self.materialize(supplied)?;
        let mut call = Call::new(self, arguments, context, api);
        match panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(&mut call))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(failure)) if failure.is_binding() => {
                Err(CallError::runtime(&self.name, failure.message()))
            }
            Ok(Err(failure)) => Err(CallError::invocation(&self.name, failure)),
            Err(payload) => Err(CallError::runtime(&self.name, panic_message(&*payload))),
        }
    }

    fn cast(&self, values: &[String], names: &[String]) -> Result<Vec<(usize, Value)>, CallError> {
        if names.is_empty() {
            return values
                .iter()
                .zip(&self.arguments)
                .enumerate()
                .map(|(position, (text, argument))| Ok((position, convert(argument, text)?)))
                .collect();
        }
        if names.len() != values.len() {
            return Err(CallError::parse(format!(
                "{} argument name(s) for {} value(s)",
                names.len(),
                values.len()
            )));
        }
        names
            .iter()
            .zip(values)
            .map(|(name, text)| {
                let position = self
                    .position_of(name)
                    .ok_or_else(|| CallError::unknown_argument(&self.name, name))?;
                let argument = self
                    .arguments
                    .get(position)
                    .ok_or_else(|| CallError::unknown_argument(&self.name, name))?;
                Ok((position, convert(argument, text)?))
            })
            .collect()
    }

    fn materialize(&self, supplied: Vec<(usize, Value)>) -> Result<Vec<Value>, CallError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.arguments.len()];
        for (position, value) in supplied {
            if let Some(slot) = slots.get_mut(position) {
                *slot = Some(value);
            }
        }
        slots
            .into_iter()
            .zip(&self.arguments)
            .enumerate()
            .map(|(position, (slot, argument))| match slot {
                Some(value) => Ok(value),
                None if position < self.required => {
                    Err(CallError::missing_argument(&self.name, argument.name()))
                }
                None => argument
                    .default_value()
                    .cloned()
                    .ok_or_else(|| CallError::missing_argument(&self.name, argument.name())),
            })
            .collect()
    }

    /// Call syntax, e.g. `String echo(String Text, [Int Times])`.
    #[must_use]
    pub fn syntax(&self) -> String {
        let arguments = self
            .arguments
            .iter()
            .enumerate()
            .map(|(position, argument)| {
                let text = format!("{} {}", argument.data_type(), argument.name());
                if position < self.required {
                    text
                } else {
                    format!("[{text}]")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}({arguments})", self.return_type, self.name)
    }

    /// JSON snapshot of the descriptor.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        let arguments = self
            .arguments
            .iter()
            .map(|argument| {
                json!({
                    "name": argument.name(),
                    "type": argument.data_type().key(),
                    "default": argument.default_value().map(Value::to_canonical_string),
                })
            })
            .collect::<Vec<_>>();
        json!({
            "name": self.name,
            "description": self.description,
            "arguments": arguments,
            "required_argument_count": self.required,
            "return_type": self.return_type.key(),
            "access_level": self.access_level,
            "auth_required": self.auth_required,
            "aliases": self.aliases,
            "labels": self.labels,
        })
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Operation")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("required", &self.required)
            .field("return_type", &self.return_type)
            .field("access_level", &self.access_level)
            .field("aliases", &self.aliases)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

fn convert(argument: &Argument, text: &str) -> Result<Value, CallError> {
    argument
        .data_type()
        .convert(text)
        .map_err(|error| error.for_argument(argument.name()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_owned()
    }
}
