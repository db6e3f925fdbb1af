//! Explicit exposure declarations.

use std::sync::Arc;

use super::call::Call;
use super::failure::OperationFailure;
use super::operation::Handler;
use super::value::Value;

/// Implemented by types that expose operations to the registry.
///
/// ```ignore
/// struct Greeter;
///
/// impl Exposable for Greeter {
///     fn declarations(&self) -> Vec<Declaration> {
///         vec![
///             Declaration::new("greet", |call| Ok(format!("Hi {}", call.str(0)?).into()))
///                 .arguments(["String"])
///                 .description("Greets the caller"),
///         ]
///     }
/// }
/// ```
pub trait Exposable {
    /// Name used in registration errors.
    fn instance_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Operations exposed by this instance.
    fn declarations(&self) -> Vec<Declaration>;
}

/// Describes one operation to register.
///
/// Unless overridden, every listed argument is required, the access level is
/// 1 and the return type is `String`.
pub struct Declaration {
    pub(crate) name: String,
    pub(crate) arguments: Vec<String>,
    pub(crate) required: Option<usize>,
    pub(crate) access_level: i32,
    pub(crate) description: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) labels: Vec<String>,
    pub(crate) auth_required: bool,
    pub(crate) returns: String,
    pub(crate) handler: Handler,
}

impl Declaration {
    /// Declares an operation called `name` backed by `handler`.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<Value, OperationFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            required: None,
            access_level: 1,
            description: String::new(),
            aliases: Vec::new(),
            labels: Vec::new(),
            auth_required: false,
            returns: "String".to_owned(),
            handler: Arc::new(handler),
        }
    }

    /// Names of registered arguments, in positional order.
    #[must_use]
    pub fn arguments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = names.into_iter().map(Into::into).collect();
        self
    }

    /// Number of leading arguments callers must supply.
    #[must_use]
    pub fn required(mut self, count: usize) -> Self {
        self.required = Some(count);
        self
    }

    /// Minimum access level a dispatcher must grant.
    #[must_use]
    pub fn access_level(mut self, level: i32) -> Self {
        self.access_level = level;
        self
    }

    /// Human readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Extra names resolving to the operation.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Registered labels grouping the operation.
    #[must_use]
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the operation as requiring an authenticated caller.
    #[must_use]
    pub fn auth_required(mut self, required: bool) -> Self {
        self.auth_required = required;
        self
    }

    /// Data type key of the return value.
    #[must_use]
    pub fn returns(mut self, data_type: impl Into<String>) -> Self {
        self.returns = data_type.into();
        self
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
