//! Blob store abstraction
//!
//! The pipeline treats every object it touches (document mirrors,
//! per-partition change lists, the change index itself) as an opaque
//! named blob behind this trait.

use crate::domain::Result;
use async_trait::async_trait;

/// Uniform get/put interface over a blob container
///
/// Implementations must give `put` overwrite semantics: writing an
/// existing key replaces its content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob's content.
    ///
    /// Returns `Ok(None)` when the blob does not exist; any other
    /// failure propagates.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a blob, overwriting any existing content under `key`.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;
}
