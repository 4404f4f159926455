//! Blob Store capability: put/get opaque bytes by key.

use async_trait::async_trait;
use bytes::Bytes;

/// Errors raised by a [`BlobStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The backing service could not be reached or refused the request.
    #[error("Blob store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid blob key '{0}'")]
    InvalidKey(String),
}

/// Object storage for uploaded images.
///
/// Writes are idempotent per key; callers always use a freshly generated key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), BlobError>;

    /// Fetch the object under `key`, or `None` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BlobError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn health_check(&self) -> Result<(), BlobError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Reject keys that could escape a storage root or address nothing.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(BlobError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("predictions/1/a.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("predictions/../secret").is_err());
        assert!(validate_key("predictions//a.jpg").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
