//! One request log entry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Crypto;

/// Everything a request log knows about one processed request.
///
/// Argument values and the raw request pass through the logger's [`Crypto`]
/// before they reach a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// When the request was read.
    pub call_time: DateTime<Utc>,
    /// Operation called, empty for file requests and unparsable input.
    pub method_name: String,
    /// `name='value'` pairs, `'value'` list, or `-` without arguments.
    pub arguments: String,
    /// File requested, empty for operation calls.
    pub filename: String,
    /// Response text, or the rendered error.
    pub response: String,
    /// Worker that processed the request.
    pub thread: String,
    /// Channel read time in milliseconds.
    pub read_time_ms: u64,
    /// Parse, invoke and wrap time in milliseconds.
    pub exec_time_ms: u64,
    /// Channel write time in milliseconds.
    pub write_time_ms: u64,
    /// Who sent the request.
    pub sender: String,
    /// The raw request text.
    pub request: String,
    /// Whether processing failed.
    pub is_error: bool,
}

impl LogRecord {
    /// Applies `crypto` to the argument values and the raw request.
    #[must_use]
    pub fn protected(&self, crypto: &dyn Crypto, names: &[String], values: &[String]) -> Self {
        let values = values
            .iter()
            .map(|value| crypto.encrypt(value))
            .collect::<Vec<_>>();
        Self {
            arguments: format_arguments(names, &values),
            request: crypto.encrypt(&self.request),
            ..self.clone()
        }
    }
}

/// Renders arguments as `A='1', B='2'`, `'1', '2'` when positional, or `-`.
#[must_use]
pub fn format_arguments(names: &[String], values: &[String]) -> String {
    if values.is_empty() {
        return "-".to_owned();
    }
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match names.get(index) {
            Some(name) => format!("{name}='{value}'"),
            None => format!("'{value}'"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[rstest]
    #[case(&[], &[], "-")]
    #[case(&[], &["1", "two"], "'1', 'two'")]
    #[case(&["A", "B"], &["1", "two"], "A='1', B='two'")]
    fn formats_arguments(#[case] names: &[&str], #[case] values: &[&str], #[case] expected: &str) {
        assert_eq!(format_arguments(&strings(names), &strings(values)), expected);
    }
}
