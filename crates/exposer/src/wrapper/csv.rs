//! Plain text output for terminals, scheduled tasks and queues.

use serde_json::Value as Json;

use super::Wrapper;
use crate::api::{CallError, Value};
use crate::context::RequestContext;

/// Renders values as plain text.
///
/// Scalars print verbatim. A JSON array of scalars prints as a
/// comma-separated list; any other JSON document is pretty-printed. Errors
/// print as `Error:` followed by one `key: value` line per field.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvWrapper;

impl Wrapper for CsvWrapper {
    fn wrap_response(&self, value: &Value, _context: &RequestContext) -> Vec<u8> {
        let text = match value {
            Value::Json(Json::Array(items)) if items.iter().all(is_scalar) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Json(document) => {
                serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string())
            }
            other => other.to_canonical_string(),
        };
        text.into_bytes()
    }

    fn wrap_error(&self, fields: &[(String, String)], _context: &RequestContext) -> Vec<u8> {
        let mut lines = vec!["Error:".to_owned()];
        lines.extend(fields.iter().map(|(key, value)| format!("{key}: {value}")));
        lines.join("\n").into_bytes()
    }

    fn wrap_file(&self, _path: &str, _context: &RequestContext) -> Result<Vec<u8>, CallError> {
        Err(CallError::UnsupportedFileRequest { wrapper: "CsvWrapper" })
    }
}

const fn is_scalar(value: &Json) -> bool {
    !matches!(value, Json::Array(_) | Json::Object(_))
}

fn scalar_text(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        other => other.to_string(),
    }
}
