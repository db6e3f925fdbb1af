//! HTTP responses for the web channel.

mod files;
mod ssi;

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use exposer_config::{BROWSER_CACHE_MAX_AGE_RANGE, Config, DEFAULT_BROWSER_CACHE_MAX_AGE, DEFAULT_SERVER_NAME};
use serde_json::json;

use self::files::FileStore;
use super::Wrapper;
use super::json::error_document;
use crate::api::{CallError, Value};
use crate::context::RequestContext;
use crate::errors::SetupError;
use crate::http::{ResponseBuilder, StatusCode};

pub(crate) const WRAPPER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::wrapper");

/// Page served for folder requests.
pub const DEFAULT_PAGE: &str = "index.html";

/// Body of `404` responses; `{file}` is replaced by the requested path.
pub const MISSING_FILE_TEMPLATE: &str =
    "<html><body><h1>404 Not Found</h1><p>The file '{file}' was not found.</p></body></html>";

/// Wraps results, errors and files as complete HTTP/1.1 responses.
///
/// Operation results are never cached by browsers; files carry the configured
/// `Cache-Control` max age. Every response carries the custom headers and a
/// `Set-Cookie` header per cookie queued on the request context.
#[derive(Debug)]
pub struct WebWrapper {
    server_name: String,
    browser_cache_max_age: u32,
    headers: Vec<(String, String)>,
    missing_file_template: String,
    files: FileStore,
}

impl WebWrapper {
    /// Starts a wrapper serving files from `web_root`.
    #[must_use]
    pub fn builder(web_root: impl Into<Utf8PathBuf>) -> WebWrapperBuilder {
        WebWrapperBuilder {
            web_root: web_root.into(),
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            browser_cache_max_age: DEFAULT_BROWSER_CACHE_MAX_AGE,
            cache_files: true,
            headers: Vec::new(),
            variables: BTreeMap::new(),
            missing_file_template: MISSING_FILE_TEMPLATE.to_owned(),
            default_page: DEFAULT_PAGE.to_owned(),
        }
    }

    /// JSON snapshot of the wrapper settings.
    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        json!({
            "web_root": self.files.root().as_str(),
            "server_name": self.server_name,
            "browser_cache_max_age": self.browser_cache_max_age,
            "custom_headers": self.headers.len(),
            "cached_files": self.files.cached_files(),
        })
    }

    fn response(&self, status: StatusCode, context: &RequestContext) -> ResponseBuilder {
        context
            .outgoing_cookies()
            .iter()
            .fold(
                ResponseBuilder::new(status, &self.server_name).headers(&self.headers),
                |builder, cookie| builder.cookie(cookie.header_value()),
            )
    }
}

impl Wrapper for WebWrapper {
    fn wrap_response(&self, value: &Value, context: &RequestContext) -> Vec<u8> {
        let (content_type, body) = if value.is_json() {
            ("application/json; charset=utf-8", value.to_json().to_string())
        } else {
            ("text/plain; charset=utf-8", value.to_canonical_string())
        };
        self.response(StatusCode::Ok, context)
            .content_type(content_type)
            .max_age(0)
            .build(body.as_bytes())
    }

    fn wrap_error(&self, fields: &[(String, String)], context: &RequestContext) -> Vec<u8> {
        self.response(StatusCode::InternalServerError, context)
            .content_type("application/json; charset=utf-8")
            .max_age(0)
            .build(error_document(fields).to_string().as_bytes())
    }

    fn wrap_file(&self, path: &str, context: &RequestContext) -> Result<Vec<u8>, CallError> {
        let served = self
            .files
            .resolve(path)
            .and_then(|resolved| self.files.load(&resolved));
        let response = match served {
            Some(file) => self
                .response(StatusCode::Ok, context)
                .content_type(file.content_type)
                .max_age(self.browser_cache_max_age)
                .build(&file.body),
            None => {
                let body = self.missing_file_template.replace("{file}", &escape_html(path));
                self.response(StatusCode::NotFound, context)
                    .content_type("text/html; charset=utf-8")
                    .max_age(0)
                    .build(body.as_bytes())
            }
        };
        Ok(response)
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builder for [`WebWrapper`].
#[derive(Debug, Clone)]
pub struct WebWrapperBuilder {
    web_root: Utf8PathBuf,
    server_name: String,
    browser_cache_max_age: u32,
    cache_files: bool,
    headers: Vec<(String, String)>,
    variables: BTreeMap<String, String>,
    missing_file_template: String,
    default_page: String,
}

impl WebWrapperBuilder {
    /// Applies the wrapper settings of a loaded configuration.
    #[must_use]
    pub fn config(self, config: &Config) -> Self {
        self.server_name(config.server_name.clone())
            .browser_cache_max_age(config.browser_cache_max_age)
            .cache_files(config.cache_files)
    }

    /// `Server` header value.
    #[must_use]
    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    /// Browser cache max age for files, in seconds.
    #[must_use]
    pub const fn browser_cache_max_age(mut self, seconds: u32) -> Self {
        self.browser_cache_max_age = seconds;
        self
    }

    /// Whether processed files are kept in memory.
    #[must_use]
    pub const fn cache_files(mut self, enabled: bool) -> Self {
        self.cache_files = enabled;
        self
    }

    /// Adds a header to every response.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Defines a variable for `<!--#echo var="name" -->` placeholders.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Body of `404` responses; `{file}` is replaced by the requested path.
    #[must_use]
    pub fn missing_file_template(mut self, template: impl Into<String>) -> Self {
        self.missing_file_template = template.into();
        self
    }

    /// Page served for folder requests.
    #[must_use]
    pub fn default_page(mut self, page: impl Into<String>) -> Self {
        self.default_page = page.into();
        self
    }

    /// Builds the wrapper.
    ///
    /// # Errors
    ///
    /// Fails when the cache age is outside `0..=604800` seconds or a header
    /// would break the response head.
    pub fn build(self) -> Result<WebWrapper, SetupError> {
        SetupError::ensure_range(
            "browser cache max age",
            i64::from(self.browser_cache_max_age),
            i64::from(*BROWSER_CACHE_MAX_AGE_RANGE.start()),
            i64::from(*BROWSER_CACHE_MAX_AGE_RANGE.end()),
        )?;
        if let Some((name, _)) = self.headers.iter().find(|(name, value)| {
            name.is_empty() || name.contains([':', '\r', '\n']) || value.contains(['\r', '\n'])
        }) {
            return Err(SetupError::InvalidName {
                name: name.clone(),
                reason: "header names cannot be empty and headers cannot contain line breaks",
            });
        }
        Ok(WebWrapper {
            server_name: self.server_name,
            browser_cache_max_age: self.browser_cache_max_age,
            headers: self.headers,
            missing_file_template: self.missing_file_template,
            files: FileStore::new(
                self.web_root,
                self.default_page,
                self.variables,
                self.cache_files,
            ),
        })
    }
}
