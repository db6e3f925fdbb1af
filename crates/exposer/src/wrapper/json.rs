//! JSON document output.

use serde_json::{Map, Value as Json, json};

use super::Wrapper;
use crate::api::{CallError, Value};
use crate::context::RequestContext;

/// Wraps results as `{"response": ...}` and errors as `{"error": {...}}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWrapper;

impl Wrapper for JsonWrapper {
    fn wrap_response(&self, value: &Value, _context: &RequestContext) -> Vec<u8> {
        json!({ "response": value.to_json() }).to_string().into_bytes()
    }

    fn wrap_error(&self, fields: &[(String, String)], _context: &RequestContext) -> Vec<u8> {
        error_document(fields).to_string().into_bytes()
    }

    fn wrap_file(&self, _path: &str, _context: &RequestContext) -> Result<Vec<u8>, CallError> {
        Err(CallError::UnsupportedFileRequest { wrapper: "JsonWrapper" })
    }
}

/// `{"error": {<key>: <value>, ...}}` for the given fields.
pub(super) fn error_document(fields: &[(String, String)]) -> Json {
    let details = fields
        .iter()
        .map(|(key, value)| (key.clone(), Json::String(value.clone())))
        .collect::<Map<_, _>>();
    json!({ "error": details })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Json {
        serde_json::from_slice(bytes).expect("valid JSON")
    }

    #[test]
    fn wraps_responses() {
        let context = RequestContext::default();
        assert_eq!(
            parse(&JsonWrapper.wrap_response(&Value::Int(3), &context)),
            json!({"response": 3})
        );
        assert_eq!(
            parse(&JsonWrapper.wrap_response(&Value::Json(json!({"a": [1]})), &context)),
            json!({"response": {"a": [1]}})
        );
    }

    #[test]
    fn wraps_errors() {
        let fields = vec![
            ("message".to_owned(), "boom".to_owned()),
            ("operation".to_owned(), "explode".to_owned()),
        ];
        assert_eq!(
            parse(&JsonWrapper.wrap_error(&fields, &RequestContext::default())),
            json!({"error": {"message": "boom", "operation": "explode"}})
        );
    }
}
