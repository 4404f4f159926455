//! Credential Store: a JSON file of secrets consulted once at startup.
//!
//! ```json
//! {
//!   "jwt_secret": "...",
//!   "storage_access_key_id": "...",
//!   "storage_secret_access_key": "..."
//! }
//! ```
//!
//! Every field is optional. Environment variables take precedence.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Secrets loaded from the credential file.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialFile {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub storage_access_key_id: Option<String>,
    #[serde(default)]
    pub storage_secret_access_key: Option<String>,
}

impl CredentialFile {
    /// Read and parse the credential file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| CredentialError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Static storage key pair, if both halves are present and non-empty.
    pub fn storage_keys(&self) -> Option<(&str, &str)> {
        match (
            non_empty(&self.storage_access_key_id),
            non_empty(&self.storage_secret_access_key),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        non_empty(&self.jwt_secret)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// Secrets never appear in logs.
impl fmt::Debug for CredentialFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialFile")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("storage_access_key_id", &self.storage_access_key_id)
            .field(
                "storage_secret_access_key",
                &self.storage_secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
