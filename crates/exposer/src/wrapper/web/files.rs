//! Reading and caching files below the web root.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::ssi;
use super::WRAPPER_TARGET;
use crate::http::{content_type_for, is_text_file};

/// A file ready to be sent.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct ServedFile {
    pub(super) body: Vec<u8>,
    pub(super) content_type: &'static str,
}

/// Resolves request paths to files and keeps their processed content.
#[derive(Debug)]
pub(super) struct FileStore {
    root: Utf8PathBuf,
    default_page: String,
    variables: BTreeMap<String, String>,
    cache_enabled: bool,
    cache: RwLock<HashMap<Utf8PathBuf, Arc<ServedFile>>>,
}

impl FileStore {
    pub(super) fn new(
        root: Utf8PathBuf,
        default_page: String,
        variables: BTreeMap<String, String>,
        cache_enabled: bool,
    ) -> Self {
        Self {
            root,
            default_page,
            variables,
            cache_enabled,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Maps a request path to a file under the root.
    ///
    /// Folders map to their default page. Paths climbing out of the root
    /// resolve to nothing.
    pub(super) fn resolve(&self, request_path: &str) -> Option<Utf8PathBuf> {
        let relative = request_path.trim_start_matches('/');
        let mut path = self.root.clone();
        for component in relative.split('/').filter(|part| !part.is_empty()) {
            if component == ".." || component == "." || component.contains('\\') {
                return None;
            }
            path.push(component);
        }
        if relative.is_empty() || relative.ends_with('/') || path.is_dir() {
            path.push(&self.default_page);
        }
        Some(path)
    }

    /// Loads the file at `path`, expanding text files.
    ///
    /// Returns `None` when the file cannot be read.
    pub(super) fn load(&self, path: &Utf8Path) -> Option<Arc<ServedFile>> {
        if self.cache_enabled {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(file) = cache.get(path) {
                return Some(Arc::clone(file));
            }
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(
                    target: WRAPPER_TARGET,
                    path = %path,
                    error = %error,
                    "file not served"
                );
                return None;
            }
        };
        let body = if is_text_file(path.as_str()) {
            let text = String::from_utf8_lossy(&bytes);
            let included = ssi::expand_includes(&text, &self.root);
            ssi::expand_variables(&included, &self.variables).into_bytes()
        } else {
            bytes
        };
        let file = Arc::new(ServedFile {
            body,
            content_type: content_type_for(path.as_str()),
        });
        if self.cache_enabled {
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.to_owned(), Arc::clone(&file));
        }
        Some(file)
    }

    pub(super) fn cached_files(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
