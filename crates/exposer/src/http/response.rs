//! HTTP response assembly.

use std::fmt;

/// Status codes the runtime emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200.
    Ok,
    /// 302.
    Found,
    /// 404.
    NotFound,
    /// 500.
    InternalServerError,
}

impl StatusCode {
    /// Numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Found => 302,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }

    /// Reason phrase.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Found => "Found",
            Self::NotFound => "Not Found",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}", self.code(), self.reason())
    }
}

/// Builds a complete HTTP/1.1 response.
///
/// Headers are written in a fixed order: `Server`, `Content-Type`,
/// `Cache-Control`, `Content-Length`, custom headers, then `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    server: String,
    content_type: Option<String>,
    max_age: Option<u32>,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
}

impl ResponseBuilder {
    /// Starts a response with `status` from `server`.
    #[must_use]
    pub fn new(status: StatusCode, server: impl Into<String>) -> Self {
        Self {
            status,
            server: server.into(),
            content_type: None,
            max_age: None,
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// Sets `Content-Type`.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets `Cache-Control: max-age=<seconds>`.
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Appends a custom header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Appends custom headers.
    #[must_use]
    pub fn headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        self.headers.extend(headers.into_iter().cloned());
        self
    }

    /// Appends a `Set-Cookie` header value.
    #[must_use]
    pub fn cookie(mut self, header_value: impl Into<String>) -> Self {
        self.cookies.push(header_value.into());
        self
    }

    /// Writes head and body into one buffer.
    #[must_use]
    pub fn build(&self, body: &[u8]) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\nServer: {}\r\n", self.status, self.server);
        if let Some(content_type) = &self.content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        if let Some(max_age) = self.max_age {
            head.push_str(&format!("Cache-Control: max-age={max_age}\r\n"));
        }
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        for cookie in &self.cookies {
            head.push_str(&format!("Set-Cookie: {cookie}\r\n"));
        }
        head.push_str("\r\n");
        let mut response = head.into_bytes();
        response.extend_from_slice(body);
        response
    }
}

/// A `302 Found` response pointing at `location`.
pub(crate) fn redirect(server: &str, location: &str) -> Vec<u8> {
    ResponseBuilder::new(StatusCode::Found, server)
        .header("Location", location)
        .build(&[])
}

/// A `200 OK` plain text response that is never cached.
pub(crate) fn plain_text(server: &str, body: &str) -> Vec<u8> {
    ResponseBuilder::new(StatusCode::Ok, server)
        .content_type("text/plain; charset=utf-8")
        .max_age(0)
        .build(body.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_follow_the_wire_order() {
        let response = ResponseBuilder::new(StatusCode::Ok, "exposer")
            .content_type("text/plain")
            .max_age(60)
            .header("X-Frame-Options", "DENY")
            .cookie("a=1")
            .build(b"hi");
        assert_eq!(
            String::from_utf8(response).expect("utf8"),
            "HTTP/1.1 200 OK\r\nServer: exposer\r\nContent-Type: text/plain\r\n\
             Cache-Control: max-age=60\r\nContent-Length: 2\r\nX-Frame-Options: DENY\r\n\
             Set-Cookie: a=1\r\n\r\nhi"
        );
    }

    #[test]
    fn redirect_carries_location() {
        let response = String::from_utf8(redirect("exposer", "https://example.com/"))
            .expect("utf8");
        assert!(response.starts_with("HTTP/1.1 302 Found\r\n"));
        assert!(response.contains("Location: https://example.com/\r\n"));
        assert!(response.ends_with("Content-Length: 0\r\nLocation: https://example.com/\r\n\r\n"));
    }
}
