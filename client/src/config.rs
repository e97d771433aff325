//! Environment-driven client configuration.

use std::path::PathBuf;

pub const BASE_URL_VAR: &str = "TASKS_API_URL";
pub const TOKEN_FILE_VAR: &str = "TASKS_TOKEN_FILE";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TOKEN_FILE: &str = ".tasks-token.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Not validated; a malformed URL surfaces as a transport error on first use.
    pub base_url: String,
    pub token_file: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    /// Read `TASKS_API_URL` and `TASKS_TOKEN_FILE`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token_file = lookup(TOKEN_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
        Self {
            base_url,
            token_file: PathBuf::from(token_file),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
