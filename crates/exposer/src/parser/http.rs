//! Parser for HTTP requests arriving over the web channel.

use percent_encoding::percent_decode_str;

use super::{Parser, Request};
use crate::api::CallError;
use crate::http::{HttpRequest, decode_component};

/// Path prefix of operation calls.
pub const API_PREFIX: &str = "/api/";

/// Maps `/api/<operation>?a=1&b=2` to a call and every other path to a file
/// request.
///
/// Arguments come from the query string and, for `POST`, the form encoded
/// body. Pairs with `=` are named arguments; a list without any `=` is
/// positional. Mixing both forms is a parse error.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpParser;

impl Parser for HttpParser {
    fn parse(&self, raw: &[u8]) -> Result<Request, CallError> {
        let request = HttpRequest::parse(raw).map_err(|error| CallError::parse(error.to_string()))?;
        let cookies = request.cookies();
        let path = request.path();
        let Some(operation) = path.strip_prefix(API_PREFIX) else {
            let file = percent_decode_str(path.trim_start_matches('/'))
                .decode_utf8_lossy()
                .into_owned();
            return Ok(Request::file(file).with_cookies(cookies));
        };
        let operation = decode_component(operation);
        if operation.is_empty() {
            return Err(CallError::parse("no operation named after /api/"));
        }
        let mut pairs = request
            .query()
            .map(split_pairs)
            .unwrap_or_default();
        if request.method().eq_ignore_ascii_case("POST") {
            pairs.extend(split_pairs(&String::from_utf8_lossy(request.body())));
        }
        let named = pairs.iter().filter(|(_, value)| value.is_some()).count();
        let parsed = if named == 0 {
            let values = pairs.into_iter().map(|(text, _)| text).collect();
            Request::call(operation, values)
        } else if named == pairs.len() {
            let (names, values) = pairs
                .into_iter()
                .map(|(name, value)| (name, value.unwrap_or_default()))
                .unzip();
            Request::named(operation, names, values)
        } else {
            return Err(CallError::parse(
                "named and positional arguments cannot be mixed",
            ));
        };
        Ok(parsed.with_cookies(cookies))
    }
}

fn split_pairs(encoded: &str) -> Vec<(String, Option<String>)> {
    encoded
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (decode_component(name), Some(decode_component(value))),
            None => (decode_component(pair), None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(raw: &str) -> Result<Request, CallError> {
        HttpParser.parse(raw.as_bytes())
    }

    #[test]
    fn query_pairs_become_named_arguments() {
        let request = parse("GET /api/echo?Text=hi+there&Times=2 HTTP/1.1\r\n\r\n")
            .expect("valid request");
        assert_eq!(request.operation(), "echo");
        assert_eq!(request.names(), ["Text", "Times"]);
        assert_eq!(request.values(), ["hi there", "2"]);
    }

    #[test]
    fn bare_values_are_positional() {
        let request =
            parse("GET /api/echo?hello%2C%20world&3 HTTP/1.1\r\n\r\n").expect("valid request");
        assert!(request.names().is_empty());
        assert_eq!(request.values(), ["hello, world", "3"]);
    }

    #[test]
    fn post_bodies_add_arguments() {
        let request = parse(
            "POST /api/echo?Times=2 HTTP/1.1\r\nContent-Length: 7\r\nCookie: id=9\r\n\r\nText=ok",
        )
        .expect("valid request");
        assert_eq!(request.names(), ["Times", "Text"]);
        assert_eq!(request.cookies().get("id").map(String::as_str), Some("9"));
    }

    #[rstest]
    #[case("GET / HTTP/1.1\r\n\r\n", "")]
    #[case("GET /css/site.css?v=3 HTTP/1.1\r\n\r\n", "css/site.css")]
    #[case("GET /my%20docs/a+b.txt HTTP/1.1\r\n\r\n", "my docs/a+b.txt")]
    fn other_paths_are_file_requests(#[case] raw: &str, #[case] expected: &str) {
        let request = parse(raw).expect("valid request");
        assert_eq!(request.file_path(), Some(expected));
    }

    #[rstest]
    #[case::mixed("GET /api/echo?a=1&b HTTP/1.1\r\n\r\n")]
    #[case::no_operation("GET /api/ HTTP/1.1\r\n\r\n")]
    #[case::not_http("echo hello")]
    fn malformed_requests_fail(#[case] raw: &str) {
        assert!(matches!(parse(raw), Err(CallError::Parse { .. })));
    }
}
