//! Configuration loaders for success and failure paths.

use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::Arc;

use camino::Utf8PathBuf;
use exposer_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader serving a temporary web root on a free local port.
pub struct TestConfigLoader {
    web_root: TempDir,
    port: u16,
}

impl TestConfigLoader {
    pub fn new() -> Self {
        let web_root = TempDir::new().expect("temporary web root");
        std::fs::write(web_root.path().join("index.html"), "<h1>exposer</h1>")
            .expect("write index page");
        let port = TcpListener::bind(("127.0.0.1", 0))
            .and_then(|listener| listener.local_addr())
            .expect("reserve a free port")
            .port();
        Self { web_root, port }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let web_root = Utf8PathBuf::from_path_buf(self.web_root.path().to_path_buf())
            .expect("temporary directory path is UTF-8");
        Ok(Config {
            web_port: self.port,
            web_threads: 2,
            web_root,
            ..Config::default()
        })
    }
}

/// Loader that fails by passing a malformed flag value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("exposerd"),
            OsString::from("--web-port"),
            OsString::from("not-a-port"),
        ])
    }
}

/// Loader producing a configuration that fails validation.
pub struct InvalidConfigLoader;

impl ConfigLoader for InvalidConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            web_threads: 0,
            ..Config::default()
        })
    }
}
