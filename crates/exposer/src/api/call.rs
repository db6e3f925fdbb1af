//! The view of a call handed to an operation handler.

use super::failure::OperationFailure;
use super::operation::Operation;
use super::registry::Api;
use super::value::Value;
use crate::context::RequestContext;

/// Arguments and request state of one invocation.
///
/// Arguments are fully materialized: every declared argument has a value,
/// with defaults filled in for omitted optional ones. The typed accessors
/// fail with a binding failure when handler code reads a position the
/// operation does not declare or reads it as the wrong type; such failures
/// surface as [`CallError::Runtime`](super::CallError::Runtime).
pub struct Call<'a> {
    operation: &'a Operation,
    arguments: Vec<Value>,
    context: &'a mut RequestContext,
    api: &'a Api,
}

impl<'a> Call<'a> {
    pub(crate) fn new(
        operation: &'a Operation,
        arguments: Vec<Value>,
        context: &'a mut RequestContext,
        api: &'a Api,
    ) -> Self {
        Self {
            operation,
            arguments,
            context,
            api,
        }
    }

    /// Name of the invoked operation.
    #[must_use]
    pub fn operation_name(&self) -> &str {
        self.operation.name()
    }

    /// All argument values in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the operation declares fewer arguments.
    #[track_caller]
    pub fn value(&self, index: usize) -> Result<&Value, OperationFailure> {
        self.arguments.get(index).ok_or_else(|| {
            OperationFailure::binding(format!(
                "operation '{}' has no argument at position {index}",
                self.operation.name()
            ))
        })
    }

    /// String value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the position is undeclared or not a string.
    #[track_caller]
    pub fn str(&self, index: usize) -> Result<&str, OperationFailure> {
        match self.value(index)? {
            Value::String(text) => Ok(text),
            other => Err(self.mismatch(index, other, "string")),
        }
    }

    /// Integer value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the position is undeclared or not an integer.
    #[track_caller]
    pub fn int(&self, index: usize) -> Result<i64, OperationFailure> {
        match self.value(index)? {
            Value::Int(number) => Ok(*number),
            other => Err(self.mismatch(index, other, "int")),
        }
    }

    /// Float value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the position is undeclared or not a float.
    #[track_caller]
    pub fn float(&self, index: usize) -> Result<f64, OperationFailure> {
        match self.value(index)? {
            Value::Float(number) => Ok(*number),
            other => Err(self.mismatch(index, other, "float")),
        }
    }

    /// Boolean value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the position is undeclared or not a boolean.
    #[track_caller]
    pub fn boolean(&self, index: usize) -> Result<bool, OperationFailure> {
        match self.value(index)? {
            Value::Boolean(flag) => Ok(*flag),
            other => Err(self.mismatch(index, other, "boolean")),
        }
    }

    /// JSON value at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the position is undeclared or not JSON.
    #[track_caller]
    pub fn json(&self, index: usize) -> Result<&serde_json::Value, OperationFailure> {
        match self.value(index)? {
            Value::Json(document) => Ok(document),
            other => Err(self.mismatch(index, other, "json")),
        }
    }

    /// Request state, read-only.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &*self.context
    }

    /// Request state, e.g. for queuing cookies.
    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut *self.context
    }

    /// The registry the operation belongs to.
    #[must_use]
    pub const fn api(&self) -> &Api {
        self.api
    }

    #[track_caller]
    fn mismatch(&self, index: usize, found: &Value, expected: &str) -> OperationFailure {
        let name = self
            .operation
            .arguments()
            .get(index)
            .map_or("?", |argument| argument.name());
        OperationFailure::binding(format!(
            "argument '{name}' of operation '{}' is {}, not {expected}",
            self.operation.name(),
            found.kind()
        ))
    }
}
