//! Persisted access token
//!
//! The only durable client-side state. Read at startup to rehydrate the
//! signed-in user; the cart itself lives on the server.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::StorefrontError;

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    /// `None` when nobody has signed in yet.
    pub fn load(&self) -> Result<Option<String>, StorefrontError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorefrontError::Session(e.to_string())),
        };
        let stored: StoredToken = serde_json::from_str(&raw).map_err(|e| StorefrontError::Session(e.to_string()))?;
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    pub fn save(&self, token: &str) -> Result<(), StorefrontError> {
        let body = serde_json::to_string(&StoredToken { token: token.to_string() }).map_err(|e| StorefrontError::Session(e.to_string()))?;
        fs::write(&self.path, body).map_err(|e| StorefrontError::Session(e.to_string()))
    }

    pub fn clear(&self) -> Result<(), StorefrontError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(StorefrontError::Session(e.to_string())),
            _ => Ok(()),
        }
    }
}
