//! The operation registry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::json;

use super::argument::Argument;
use super::data_type::DataType;
use super::declaration::{Declaration, Exposable};
use super::errors::CallError;
use super::help;
use super::operation::{Operation, OperationParts};
use crate::errors::{SetupError, validate_name};

/// Label applied to the built-in operations.
pub const API_LABEL: &str = "API";

/// A named group of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    name: String,
    description: String,
}

impl Label {
    /// Label name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Registry of arguments, labels, aliases and operations.
///
/// Built once at startup, then shared read-only behind an [`Arc`] by every
/// dispatcher.
#[derive(Debug)]
pub struct Api {
    arguments: BTreeMap<String, Arc<Argument>>,
    labels: BTreeMap<String, Label>,
    aliases: BTreeMap<String, String>,
    operations: BTreeMap<String, Arc<Operation>>,
}

impl Api {
    /// Creates a registry holding the built-in arguments, the `API` label and
    /// the `help` operation.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-ins go through the same validation
    /// as user registrations.
    pub fn new() -> Result<Self, SetupError> {
        let mut api = Self {
            arguments: BTreeMap::new(),
            labels: BTreeMap::new(),
            aliases: BTreeMap::new(),
            operations: BTreeMap::new(),
        };
        for argument in builtin_arguments()? {
            api.add_argument(argument)?;
        }
        api.add_label(API_LABEL, "Operations of the dispatch runtime itself")?;
        api.register(&help::Help)?;
        Ok(api)
    }

    /// Adds a reusable argument.
    ///
    /// # Errors
    ///
    /// Fails when an argument with the same name exists.
    pub fn add_argument(&mut self, argument: Argument) -> Result<&mut Self, SetupError> {
        if self.arguments.contains_key(argument.name()) {
            return Err(SetupError::duplicate("argument", argument.name()));
        }
        self.arguments
            .insert(argument.name().to_owned(), Arc::new(argument));
        Ok(self)
    }

    /// Adds a label.
    ///
    /// # Errors
    ///
    /// Fails for invalid or duplicate names.
    pub fn add_label(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<&mut Self, SetupError> {
        let name = name.into();
        validate_name(&name)?;
        if self.labels.contains_key(&name) {
            return Err(SetupError::duplicate("label", name));
        }
        let label = Label {
            name: name.clone(),
            description: description.into(),
        };
        self.labels.insert(name, label);
        Ok(self)
    }

    /// Registers every operation `instance` declares.
    ///
    /// All declarations are validated before any is inserted, so a failure
    /// leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Registration`] naming the first offending
    /// operation and the instance.
    pub fn register<E>(&mut self, instance: &E) -> Result<&mut Self, SetupError>
    where
        E: Exposable + ?Sized,
    {
        let mut pending = Vec::new();
        let mut claimed = BTreeSet::new();
        for declaration in instance.declarations() {
            let name = declaration.name().to_owned();
            let operation = self
                .build_operation(declaration, &claimed)
                .map_err(|source| {
                    SetupError::registration(instance.instance_name(), &name, source)
                })?;
            claimed.insert(operation.name().to_owned());
            claimed.extend(operation.aliases().iter().cloned());
            pending.push(operation);
        }
        for operation in pending {
            for alias in operation.aliases() {
                self.aliases
                    .insert(alias.clone(), operation.name().to_owned());
            }
            self.operations
                .insert(operation.name().to_owned(), Arc::new(operation));
        }
        Ok(self)
    }

    fn build_operation(
        &self,
        declaration: Declaration,
        claimed: &BTreeSet<String>,
    ) -> Result<Operation, SetupError> {
        validate_name(&declaration.name)?;
        self.ensure_unclaimed(&declaration.name, claimed)?;
        let mut aliases = BTreeSet::new();
        for alias in declaration.aliases {
            validate_name(&alias)?;
            if alias == declaration.name || aliases.contains(&alias) {
                return Err(SetupError::duplicate("alias", alias));
            }
            self.ensure_unclaimed(&alias, claimed)?;
            aliases.insert(alias);
        }
        let arguments = declaration
            .arguments
            .iter()
            .map(|name| {
                self.arguments
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SetupError::unknown_argument(name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let labels = declaration
            .labels
            .into_iter()
            .map(|label| {
                if self.labels.contains_key(&label) {
                    Ok(label)
                } else {
                    Err(SetupError::unknown_label(label))
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        let return_type = DataType::from_key(&declaration.returns)?;
        let required = declaration.required.unwrap_or(arguments.len());
        Operation::new(OperationParts {
            name: declaration.name,
            description: declaration.description,
            arguments,
            required,
            return_type,
            access_level: declaration.access_level,
            auth_required: declaration.auth_required,
            aliases,
            labels,
            handler: declaration.handler,
        })
    }

    fn ensure_unclaimed(&self, name: &str, claimed: &BTreeSet<String>) -> Result<(), SetupError> {
        if self.operations.contains_key(name)
            || self.aliases.contains_key(name)
            || claimed.contains(name)
        {
            return Err(SetupError::duplicate("operation", name));
        }
        Ok(())
    }

    /// Resolves an operation by name, then by alias.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::UnknownOperation`] when nothing matches.
    pub fn resolve(&self, name: &str) -> Result<&Arc<Operation>, CallError> {
        self.operations
            .get(name)
            .or_else(|| {
                self.aliases
                    .get(name)
                    .and_then(|target| self.operations.get(target))
            })
            .ok_or_else(|| CallError::unknown_operation(name))
    }

    /// Registered argument called `name`.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Arc<Argument>> {
        self.arguments.get(name)
    }

    /// Registered label called `name`.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    /// Operations, sorted by name.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.operations.values()
    }

    /// Labels, sorted by name.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    /// JSON snapshot of everything registered.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        let arguments = self
            .arguments
            .values()
            .map(|argument| {
                json!({
                    "name": argument.name(),
                    "type": argument.data_type().key(),
                    "description": argument.description(),
                })
            })
            .collect::<Vec<_>>();
        let labels = self
            .labels
            .values()
            .map(|label| json!({"name": label.name(), "description": label.description()}))
            .collect::<Vec<_>>();
        json!({
            "data_types": DataType::ALL.iter().map(|data_type| data_type.key()).collect::<Vec<_>>(),
            "arguments": arguments,
            "labels": labels,
            "aliases": self.aliases,
            "operations": self.operations.values().map(|operation| operation.status()).collect::<Vec<_>>(),
        })
    }
}

fn builtin_arguments() -> Result<Vec<Argument>, SetupError> {
    Ok(vec![
        Argument::builder("Float", DataType::Float)
            .description("A floating point number")
            .build()?,
        Argument::builder("Json", DataType::Json)
            .description("A JSON document")
            .build()?,
        Argument::builder("Int", DataType::Int)
            .description("An integer")
            .default_value("0")
            .build()?,
        Argument::builder("String", DataType::String)
            .description("Any text")
            .build()?,
        Argument::builder("SearchString", DataType::String)
            .description("Only operations whose name contains this text are listed")
            .default_value("")
            .build()?,
        Argument::builder("Options", DataType::String)
            .description("v for verbose output, l to list labels")
            .default_value("")
            .build()?,
    ])
}
