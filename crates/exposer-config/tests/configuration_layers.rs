//! Integration tests for layered configuration loading.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use exposer_config::{Config, DEFAULT_WEB_PORT, LogFormat};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe on edition 2024; the guard serialises
        // every override in this test binary.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

#[test]
fn defaults_apply_without_overrides() {
    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let config =
        Config::load_from_iter([OsString::from("exposerd")]).expect("defaults should load");
    assert_eq!(config.web_port, DEFAULT_WEB_PORT);
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(config.cache_files);
}

#[test]
fn command_line_overrides_environment() {
    let _env = EnvOverride::set_var("EXPOSER_WEB_PORT", OsStr::new("7000"));
    let args = vec![
        OsString::from("exposerd"),
        OsString::from("--web-port"),
        OsString::from("6000"),
    ];

    let config = Config::load_from_iter(args).expect("config should load");
    assert_eq!(config.web_port, 6000);
}

#[test]
fn configuration_file_values_are_loaded() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("exposer.toml");
    fs::write(&path, "web_threads = 4\nlog_format = \"compact\"\n").expect("write config");

    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let args = vec![
        OsString::from("exposerd"),
        OsString::from("--config-path"),
        path.into_os_string(),
    ];

    let config = Config::load_from_iter(args).expect("config should load");
    assert_eq!(config.web_threads, 4);
    assert_eq!(config.log_format, LogFormat::Compact);
}

#[test]
fn malformed_configuration_file_fails() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("exposer.toml");
    fs::write(&path, "web_port = not_a_number\n").expect("write malformed config");

    let _lock = ENV_MUTEX.lock().expect("env mutex poisoned");
    let args = vec![
        OsString::from("exposerd"),
        OsString::from("--config-path"),
        path.into_os_string(),
    ];

    assert!(Config::load_from_iter(args).is_err());
}
