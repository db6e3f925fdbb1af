//! File extension to content type mapping.

const TEXT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript; charset=utf-8"),
    ("json", "application/json; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("xml", "application/xml; charset=utf-8"),
    ("svg", "image/svg+xml; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("md", "text/markdown; charset=utf-8"),
];

const BINARY_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
];

const FALLBACK: &str = "application/octet-stream";

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

fn lookup(table: &[(&str, &'static str)], extension: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == extension)
        .map(|(_, content_type)| *content_type)
}

/// Content type for a file path, by extension.
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    extension(path)
        .and_then(|extension| {
            lookup(TEXT_TYPES, &extension).or_else(|| lookup(BINARY_TYPES, &extension))
        })
        .unwrap_or(FALLBACK)
}

/// Whether a file is served through server-side include expansion.
#[must_use]
pub fn is_text_file(path: &str) -> bool {
    extension(path).is_some_and(|extension| lookup(TEXT_TYPES, &extension).is_some())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("index.html", "text/html; charset=utf-8")]
    #[case("css/site.CSS", "text/css; charset=utf-8")]
    #[case("img/logo.png", "image/png")]
    #[case("archive.tar.gz", "application/octet-stream")]
    #[case("v1.2/README", "application/octet-stream")]
    fn maps_extensions(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(path), expected);
    }

    #[test]
    fn text_detection_follows_the_text_table() {
        assert!(is_text_file("a/b/page.htm"));
        assert!(!is_text_file("photo.jpeg"));
        assert!(!is_text_file("Makefile"));
    }
}
