//! In-memory blob store
//!
//! Backs dry-run mode and tests. Puts overwrite, gets return `None`
//! for absent keys, matching the remote store's contract.

use crate::adapters::blob::traits::BlobStore;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Map-backed [`BlobStore`]
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys currently held, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("changes/index").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryBlobStore::new();
        store.put("a.json", b"{}".to_vec()).await.unwrap();
        assert_eq!(store.get("a.json").await.unwrap(), Some(b"{}".to_vec()));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryBlobStore::new();
        store.put("a.json", b"one".to_vec()).await.unwrap();
        store.put("a.json", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("a.json").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let store = MemoryBlobStore::new();
        store.put("changes/index", Vec::new()).await.unwrap();
        store.put("a.json", Vec::new()).await.unwrap();
        assert_eq!(store.keys(), vec!["a.json", "changes/index"]);
    }
}
