//! Named, typed arguments shared between operations.

use super::data_type::DataType;
use super::value::Value;
use crate::errors::{SetupError, validate_name};

/// An argument an operation can accept.
///
/// Arguments are registered once in the [`Api`](super::Api) and referenced by
/// name from any number of operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    data_type: DataType,
    description: String,
    default: Option<Value>,
}

impl Argument {
    /// Starts building an argument.
    #[must_use]
    pub fn builder(name: impl Into<String>, data_type: DataType) -> ArgumentBuilder {
        ArgumentBuilder {
            name: name.into(),
            data_type,
            description: String::new(),
            default: None,
        }
    }

    /// Argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type values are converted to.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Pre-converted default value, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Builder for [`Argument`].
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    name: String,
    data_type: DataType,
    description: String,
    default: Option<String>,
}

impl ArgumentBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the default value, given in request text form.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Validates the name and converts the default value.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidName`] for names the parsers cannot carry
    /// and [`SetupError::InvalidDefault`] when the default does not convert.
    pub fn build(self) -> Result<Argument, SetupError> {
        validate_name(&self.name)?;
        let default = match self.default {
            Some(text) => match self.data_type.convert(&text) {
                Ok(value) => Some(value),
                Err(error) => {
                    return Err(SetupError::InvalidDefault {
                        argument: self.name,
                        value: text,
                        reason: error.to_string(),
                    });
                }
            },
            None => None,
        };
        Ok(Argument {
            name: self.name,
            data_type: self.data_type,
            description: self.description,
            default,
        })
    }
}
