//! In-memory [`BlobStore`] for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;
use banamon_core::blob::{validate_key, BlobError, BlobStore};
use bytes::Bytes;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Bytes)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Content type recorded for `key`.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().await.get(key).map(|(ct, _)| ct.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BlobError> {
        validate_key(key)?;
        Ok(self.objects.read().await.get(key).map(|(_, b)| b.clone()))
    }

    async fn health_check(&self) -> Result<(), BlobError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrites_same_key() {
        let store = MemoryBlobStore::new();
        store.put("a/b.png", Bytes::from_static(b"1"), "image/png").await.unwrap();
        store.put("a/b.png", Bytes::from_static(b"2"), "image/png").await.unwrap();

        assert_eq!(store.keys().await, ["a/b.png"]);
        assert_eq!(store.get("a/b.png").await.unwrap().unwrap(), Bytes::from_static(b"2"));
        assert_eq!(store.content_type("a/b.png").await.as_deref(), Some("image/png"));
    }
}
