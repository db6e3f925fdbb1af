//! HTTP request head parsing.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::cookie::parse_cookie_header;

/// Errors raised while parsing a request head.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HttpParseError {
    /// The request did not contain a blank line ending the head.
    #[error("request head is incomplete")]
    IncompleteHead,
    /// The head is not valid UTF-8.
    #[error("request head is not valid UTF-8")]
    InvalidUtf8,
    /// The request line is not `METHOD TARGET VERSION`.
    #[error("malformed request line '{line}'")]
    RequestLine {
        /// The offending line.
        line: String,
    },
    /// A header line lacks a colon.
    #[error("malformed header line '{line}'")]
    Header {
        /// The offending line.
        line: String,
    },
}

/// A parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    target: String,
    version: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Parses a complete request: head, blank line and optional body.
    ///
    /// # Errors
    ///
    /// Fails when the head is incomplete, not UTF-8, or malformed.
    pub fn parse(raw: &[u8]) -> Result<Self, HttpParseError> {
        let end = header_end(raw).ok_or(HttpParseError::IncompleteHead)?;
        let (head, rest) = raw.split_at(end);
        let head = std::str::from_utf8(head).map_err(|_| HttpParseError::InvalidUtf8)?;
        let mut lines = head.lines().filter(|line| !line.is_empty());
        let request_line = lines.next().ok_or(HttpParseError::IncompleteHead)?;
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(HttpParseError::RequestLine {
                line: request_line.to_owned(),
            });
        };
        if !version.starts_with("HTTP/") {
            return Err(HttpParseError::RequestLine {
                line: request_line.to_owned(),
            });
        }
        let headers = lines
            .map(|line| {
                line.split_once(':')
                    .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
                    .ok_or_else(|| HttpParseError::Header {
                        line: line.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut request = Self {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
            headers,
            body: Vec::new(),
        };
        let length = request
            .header("Content-Length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(rest.len());
        request.body = rest.iter().take(length).copied().collect();
        Ok(request)
    }

    /// Request method, e.g. `GET`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw request target, path plus query.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Protocol version, e.g. `HTTP/1.1`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Path part of the target.
    #[must_use]
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    /// Query part of the target, without the `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// First header called `name`, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Cookies from the `Cookie` header.
    #[must_use]
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.header("Cookie")
            .map(parse_cookie_header)
            .unwrap_or_default()
    }
}

/// Percent-decodes a URL component, treating `+` as a space.
#[must_use]
pub fn decode_component(component: &str) -> String {
    percent_decode_str(&component.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Offset just past the blank line ending the head, if present.
pub(crate) fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|position| position + 4)
        .or_else(|| {
            buffer
                .windows(2)
                .position(|window| window == b"\n\n")
                .map(|position| position + 2)
        })
}

/// `Content-Length` announced by a head, zero when absent or malformed.
pub(crate) fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
