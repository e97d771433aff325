//! Credential providers consulted before every authenticated call.
//!
//! # Design
//! The client never caches a token: `CredentialProvider::token` is called
//! once per authenticated request, so a login, logout or token refresh done
//! elsewhere takes effect on the next call. A missing token is not an error
//! here; the request goes out and the server answers 401.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

/// Key under which `FileTokenStore` keeps the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Source of the bearer token for authenticated requests.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// An in-process token slot that can be replaced while clients hold it.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl CredentialProvider for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Errors writing to a `FileTokenStore`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("token store is not a JSON object: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persistent key-value storage backed by a JSON object file.
///
/// The token lives under [`TOKEN_KEY`]; other keys in the file are kept
/// untouched on write.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `token`, typically the result of a successful login.
    pub fn store(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.save(&entries)
    }

    /// Remove the token, leaving any other keys in place.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl CredentialProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.load() {
            Ok(entries) => entries.get(TOKEN_KEY).and_then(Value::as_str).map(str::to_string),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read token store");
                None
            }
        }
    }
}
