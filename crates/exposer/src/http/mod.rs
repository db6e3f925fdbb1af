//! Minimal HTTP/1.x message handling for the web channel and wrapper.
//!
//! Only what one request per connection needs: a request head parser, a
//! response head builder, cookies and content types. No chunked transfer, no
//! keep-alive.

mod content_type;
mod cookie;
mod request;
mod response;

pub use self::content_type::{content_type_for, is_text_file};
pub use self::cookie::{Cookie, parse_cookie_header};
pub use self::request::{HttpParseError, HttpRequest, decode_component};
pub(crate) use self::request::{content_length, header_end};
pub use self::response::{ResponseBuilder, StatusCode};
pub(crate) use self::response::{plain_text, redirect};
