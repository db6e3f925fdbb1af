//! Server-side include and echo expansion for text files.

use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

#[expect(clippy::expect_used, reason = "the pattern is a literal")]
static INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!--#include file="([\w,/]+\.[A-Za-z]{2,4})" ?-->"#)
        .expect("include pattern is valid")
});

#[expect(clippy::expect_used, reason = "the pattern is a literal")]
static ECHO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!--#echo var="([A-Za-z0-9_]{3,25})" ?-->"#).expect("echo pattern is valid")
});

/// Replaces `<!--#include file="name.ext" -->` with the content of `name.ext`
/// under `root`.
///
/// Includes are not expanded recursively. A missing file leaves
/// `Include file '<path>' not found` in its place.
pub(super) fn expand_includes(text: &str, root: &Utf8Path) -> String {
    INCLUDE
        .replace_all(text, |captures: &Captures<'_>| {
            let name = captures.get(1).map_or("", |found| found.as_str());
            let path = root.join(name);
            fs::read(&path).map_or_else(
                |_| format!("Include file '{path}' not found"),
                |bytes| String::from_utf8_lossy(&bytes).into_owned(),
            )
        })
        .into_owned()
}

/// Replaces `<!--#echo var="NAME" -->` with the value of `NAME`.
///
/// Placeholders naming unknown variables are left untouched.
pub(super) fn expand_variables(text: &str, variables: &BTreeMap<String, String>) -> String {
    ECHO.replace_all(text, |captures: &Captures<'_>| {
        captures
            .get(1)
            .and_then(|name| variables.get(name.as_str()))
            .map_or_else(
                || captures.get(0).map_or_else(String::new, |all| all.as_str().to_owned()),
                Clone::clone,
            )
    })
    .into_owned()
}
