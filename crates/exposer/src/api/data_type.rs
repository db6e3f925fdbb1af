//! Converters from request text to typed [`Value`]s.

use std::fmt;

use super::errors::CallError;
use super::value::Value;
use crate::errors::SetupError;

/// The data types an argument or return value can have.
///
/// Each variant is a process-wide singleton; the registry refers to them by
/// their wire [`key`](Self::key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    /// 64-bit signed integer.
    Int,
    /// Finite 64-bit float.
    Float,
    /// `true` or `false`, case-insensitive.
    Boolean,
    /// Any text.
    String,
    /// ASCII letters and digits only.
    AlphaNumericString,
    /// Any JSON document.
    Json,
    /// Any text; used mostly for operations returning loosely typed results.
    Object,
}

impl DataType {
    /// Every data type, in registry order.
    pub const ALL: [Self; 7] = [
        Self::Int,
        Self::Float,
        Self::Boolean,
        Self::String,
        Self::AlphaNumericString,
        Self::Json,
        Self::Object,
    ];

    /// Wire name of the data type.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::AlphaNumericString => "AlphNumString",
            Self::Json => "JSON",
            Self::Object => "Object",
        }
    }

    /// Resolves a wire name to a data type.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownDataType`] when no data type has that key.
    pub fn from_key(key: &str) -> Result<Self, SetupError> {
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.key() == key)
            .ok_or_else(|| SetupError::unknown_data_type(key))
    }

    /// Converts request text into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::InvalidArgumentValue`] when the text is not a valid
    /// representation of this data type. The argument name is left empty; the
    /// caller fills it in with [`CallError::for_argument`].
    pub fn convert(self, text: &str) -> Result<Value, CallError> {
        let invalid = |reason: &str| CallError::invalid_argument_value("", text, self, reason);
        match self {
            Self::Int => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|error| invalid(&error.to_string())),
            Self::Float => match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Value::Float(value)),
                Ok(_) => Err(invalid("value is not finite")),
                Err(error) => Err(invalid(&error.to_string())),
            },
            Self::Boolean => {
                let trimmed = text.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(invalid("expected true or false"))
                }
            }
            Self::String | Self::Object => Ok(Value::String(text.to_owned())),
            Self::AlphaNumericString => {
                if !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric()) {
                    Ok(Value::String(text.to_owned()))
                } else {
                    Err(invalid("only ASCII letters and digits are allowed"))
                }
            }
            Self::Json => serde_json::from_str(text)
                .map(Value::Json)
                .map_err(|error| invalid(&error.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::int(DataType::Int, Value::Int(-42))]
    #[case::int_max(DataType::Int, Value::Int(i64::MAX))]
    #[case::float(DataType::Float, Value::Float(0.1))]
    #[case::float_whole(DataType::Float, Value::Float(3.0))]
    #[case::boolean(DataType::Boolean, Value::Boolean(false))]
    #[case::string(DataType::String, Value::String("a, \"b\" åäö".to_owned()))]
    #[case::alnum(DataType::AlphaNumericString, Value::String("abc123".to_owned()))]
    #[case::json(DataType::Json, Value::Json(serde_json::json!({"a": [1, 2, {"b": null}]})))]
    fn canonical_text_converts_back(#[case] data_type: DataType, #[case] value: Value) {
        let text = value.to_canonical_string();
        assert_eq!(data_type.convert(&text).expect("convert"), value);
    }

    #[rstest]
    #[case::int(DataType::Int, "12a")]
    #[case::int_overflow(DataType::Int, "99999999999999999999")]
    #[case::float(DataType::Float, "one")]
    #[case::float_infinite(DataType::Float, "inf")]
    #[case::boolean(DataType::Boolean, "yes")]
    #[case::alnum_space(DataType::AlphaNumericString, "abc 123")]
    #[case::alnum_empty(DataType::AlphaNumericString, "")]
    #[case::json(DataType::Json, "{\"a\":")]
    fn rejects_malformed_text(#[case] data_type: DataType, #[case] text: &str) {
        let error = data_type.convert(text).expect_err("conversion should fail");
        assert!(matches!(error, CallError::InvalidArgumentValue { .. }));
    }

    #[test]
    fn boolean_is_case_insensitive() {
        assert_eq!(DataType::Boolean.convert("TRUE").ok(), Some(Value::Boolean(true)));
    }

    #[test]
    fn keys_resolve_to_data_types() {
        for data_type in DataType::ALL {
            assert_eq!(DataType::from_key(data_type.key()).ok(), Some(data_type));
        }
        assert!(matches!(
            DataType::from_key("Date"),
            Err(SetupError::UnknownDataType { .. })
        ));
    }
}
