//! Protection of sensitive values before they are logged.

/// Transforms argument values and raw requests before they reach a sink.
pub trait Crypto: Send + Sync {
    /// Returns the text to log in place of `value`.
    fn encrypt(&self, value: &str) -> String;
}

/// Logs values as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCrypto;

impl Crypto for NoCrypto {
    fn encrypt(&self, value: &str) -> String {
        value.to_owned()
    }
}

/// Replaces every non-empty value with `***`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Redact;

impl Crypto for Redact {
    fn encrypt(&self, value: &str) -> String {
        if value.is_empty() {
            String::new()
        } else {
            "***".to_owned()
        }
    }
}
