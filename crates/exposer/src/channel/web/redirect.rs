//! Redirect rules answered directly by the web channel.

use url::{Host, Url};

use crate::errors::SetupError;
use crate::http::HttpRequest;

/// A rule turning matching requests into `302` responses.
///
/// The request URL is rebuilt from `X-Forwarded-Proto` (default `http`), the
/// `Host` header and the request target; only the matched component is
/// replaced, so paths and query strings survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Moves requests for one host to another.
    Host {
        /// Host to match, ignoring ASCII case.
        from: String,
        /// Replacement host.
        to: String,
    },
    /// Moves every plain `http` request to `https`.
    Https,
    /// Moves requests for one path to another.
    File {
        /// Path to match, with leading slash.
        from: String,
        /// Replacement path, with leading slash.
        to: String,
    },
}

impl Redirect {
    /// Redirects `from` to `to`.
    ///
    /// # Errors
    ///
    /// Fails when either side is not a valid host name.
    pub fn host(from: impl Into<String>, to: impl Into<String>) -> Result<Self, SetupError> {
        let from = from.into();
        let to = to.into();
        for host in [&from, &to] {
            Host::parse(host).map_err(|error| SetupError::Redirect {
                reason: format!("'{host}' is not a valid host: {error}"),
            })?;
        }
        Ok(Self::Host { from, to })
    }

    /// Redirects plain `http` requests to `https`.
    #[must_use]
    pub const fn https() -> Self {
        Self::Https
    }

    /// Redirects requests for path `from` to path `to`.
    #[must_use]
    pub fn file(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        Self::File {
            from: rooted(from.as_ref()),
            to: rooted(to.as_ref()),
        }
    }

    /// Target of the redirect, if `request` matches this rule.
    #[must_use]
    pub fn location(&self, request: &HttpRequest) -> Option<String> {
        let mut url = request_url(request)?;
        match self {
            Self::Host { from, to } => {
                if !url.host_str()?.eq_ignore_ascii_case(from) {
                    return None;
                }
                url.set_host(Some(to)).ok()?;
            }
            Self::Https => {
                if url.scheme() == "https" {
                    return None;
                }
                url.set_scheme("https").ok()?;
            }
            Self::File { from, to } => {
                if url.path() != from {
                    return None;
                }
                url.set_path(to);
            }
        }
        Some(url.to_string())
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

fn request_url(request: &HttpRequest) -> Option<Url> {
    let scheme = request
        .header("X-Forwarded-Proto")
        .and_then(|value| value.split(',').next())
        .map_or_else(|| "http".to_owned(), |value| value.trim().to_ascii_lowercase());
    let host = request.header("Host")?;
    Url::parse(&format!("{scheme}://{host}{}", request.target())).ok()
}
