//! Parser for single-line text requests.

use super::splitter::split_arguments;
use super::{Parser, Request};
use crate::api::CallError;

/// Parses `<operation> <arguments>`, e.g. `echo "a, b", 2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextParser;

impl Parser for TextParser {
    fn parse(&self, raw: &[u8]) -> Result<Request, CallError> {
        let text = std::str::from_utf8(raw)
            .map_err(|error| CallError::parse(format!("request is not UTF-8: {error}")))?
            .trim();
        if text.is_empty() {
            return Err(CallError::parse("request is empty"));
        }
        let (operation, arguments) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));
        Ok(Request::call(operation, split_arguments(arguments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_operation_from_arguments() {
        let request = TextParser
            .parse(b"echo \"a, b\", 2\n")
            .expect("valid request");
        assert_eq!(request.operation(), "echo");
        assert_eq!(request.values(), ["a, b", "2"]);
        assert!(request.names().is_empty());
        assert_eq!(request.file_path(), None);
    }

    #[test]
    fn operation_without_arguments() {
        let request = TextParser.parse(b"  help  ").expect("valid request");
        assert_eq!(request.operation(), "help");
        assert!(request.values().is_empty());
    }

    #[test]
    fn blank_and_binary_input_fail() {
        assert!(matches!(
            TextParser.parse(b" \r\n"),
            Err(CallError::Parse { .. })
        ));
        assert!(matches!(
            TextParser.parse(&[0xff, 0xfe]),
            Err(CallError::Parse { .. })
        ));
    }
}
