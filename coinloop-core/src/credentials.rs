//! API key persistence.
//!
//! Keys are stored as a small JSON object `{"access_key", "secret_key"}`.
//! The secret lives in a `SecretString`: it is never printed and its memory
//! is zeroed on drop. Nothing in this crate inspects the key contents; they
//! are handed to the account collaborator as-is.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// On-disk shape. Only used transiently while reading or writing.
#[derive(Serialize, Deserialize)]
struct StoredKeys {
    access_key: String,
    secret_key: String,
}

#[derive(Clone)]
pub struct ApiKeys {
    access_key: String,
    secret_key: SecretString,
}

impl ApiKeys {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, CredentialError> {
        let access_key = access_key.into().trim().to_string();
        let secret_key = secret_key.into().trim().to_string();
        if access_key.is_empty() {
            return Err(CredentialError::Empty("access key"));
        }
        if secret_key.is_empty() {
            return Err(CredentialError::Empty("secret key"));
        }
        Ok(Self {
            access_key,
            secret_key: SecretString::from(secret_key),
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Only for request signing. Never log the result.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Credential file location plus load/save.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no file has been saved yet.
    pub fn load(&self) -> Result<Option<ApiKeys>, CredentialError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let stored: StoredKeys = serde_json::from_str(&content)?;
        ApiKeys::new(stored.access_key, stored.secret_key).map(Some)
    }

    /// Save keys, creating parent directories if needed.
    pub fn save(&self, keys: &ApiKeys) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let stored = StoredKeys {
            access_key: keys.access_key.clone(),
            secret_key: keys.expose_secret().to_string(),
        };
        let json = serde_json::to_string(&stored)?;
        std::fs::write(&self.path, json).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let keys = ApiKeys::new("access", "very-secret").unwrap();
        let debug = format!("{keys:?}");
        assert!(debug.contains("access"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn empty_keys_rejected() {
        assert!(matches!(
            ApiKeys::new("  ", "s"),
            Err(CredentialError::Empty("access key"))
        ));
        assert!(ApiKeys::new("a", "").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("config").join("api_keys.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&ApiKeys::new("ak", "sk").unwrap()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_key(), "ak");
        assert_eq!(loaded.expose_secret(), "sk");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"access_key":"ak","secret_key":"sk"}"#);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            CredentialStore::new(path).load(),
            Err(CredentialError::Format(_))
        ));
    }
}
