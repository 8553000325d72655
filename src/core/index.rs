//! The durable change index
//!
//! A single small blob (`changes/index`) holding every partition key
//! ever flushed, newline-joined and ascending. The last entry is the
//! resume point: the lower time bound for the next run's query. The
//! index is the only state the pipeline keeps between runs.

use crate::adapters::blob::BlobStore;
use crate::domain::{PartitionKey, Result, StrataError};
use std::collections::BTreeSet;

/// Fixed key of the index blob.
pub const INDEX_BLOB: &str = "changes/index";

/// Prefix under which per-partition change lists are stored.
pub const CHANGES_PREFIX: &str = "changes/";

/// Ordered, deduplicated collection of flushed partition keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeIndex {
    entries: Vec<PartitionKey>,
}

impl ChangeIndex {
    /// Fetch the index blob.
    ///
    /// An absent blob means this is the first run and yields an empty
    /// index. Any other storage failure is fatal: the pipeline must
    /// not proceed without certainty about prior progress.
    pub async fn load(store: &dyn BlobStore) -> Result<Self> {
        let content = store.get(INDEX_BLOB).await.map_err(|e| {
            StrataError::Index(format!("failed to fetch the change index: {e}"))
        })?;

        let Some(content) = content else {
            tracing::info!("No change index found, starting from scratch");
            return Ok(Self::default());
        };

        let text = String::from_utf8(content)
            .map_err(|e| StrataError::Index(format!("change index is not valid UTF-8: {e}")))?;

        let mut entries = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            entries.push(PartitionKey::parse(line.trim())?);
        }

        Ok(Self { entries })
    }

    /// Merge new partition keys: set union, ascending order. No I/O.
    pub fn merge(&mut self, new_keys: impl IntoIterator<Item = PartitionKey>) {
        let mut union: BTreeSet<PartitionKey> = self.entries.drain(..).collect();
        union.extend(new_keys);
        self.entries = union.into_iter().collect();
    }

    /// Overwrite the index blob with the current entries.
    ///
    /// Must only be called after the corresponding partition change
    /// lists have been durably written; the index must never point
    /// past data that was not actually flushed.
    pub async fn save(&self, store: &dyn BlobStore) -> Result<()> {
        let body = self
            .entries
            .iter()
            .map(PartitionKey::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        store.put(INDEX_BLOB, body.into_bytes()).await.map_err(|e| {
            StrataError::Index(format!("failed to persist the change index: {e}"))
        })
    }

    /// The most recent partition key, if any.
    pub fn last(&self) -> Option<&PartitionKey> {
        self.entries.last()
    }

    /// All entries, ascending.
    pub fn entries(&self) -> &[PartitionKey] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Key of the change-list blob for one partition.
pub fn partition_blob_key(partition: &PartitionKey) -> String {
    format!("{CHANGES_PREFIX}{partition}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::blob::MemoryBlobStore;

    fn key(s: &str) -> PartitionKey {
        PartitionKey::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_load_absent_index_is_empty() {
        let store = MemoryBlobStore::new();
        let index = ChangeIndex::load(&store).await.unwrap();
        assert!(index.is_empty());
        assert!(index.last().is_none());
    }

    #[tokio::test]
    async fn test_load_parses_entries_in_order() {
        let store = MemoryBlobStore::new();
        store
            .put(INDEX_BLOB, b"2023-01-01-00\n2023-01-01-01".to_vec())
            .await
            .unwrap();

        let index = ChangeIndex::load(&store).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.last().unwrap().as_str(), "2023-01-01-01");
    }

    #[tokio::test]
    async fn test_load_rejects_garbage_entries() {
        let store = MemoryBlobStore::new();
        store
            .put(INDEX_BLOB, b"2023-01-01-00\nnot-a-partition".to_vec())
            .await
            .unwrap();

        let err = ChangeIndex::load(&store).await.unwrap_err();
        assert!(matches!(err, StrataError::Index(_)));
    }

    #[test]
    fn test_merge_unions_sorts_and_dedupes() {
        let mut index = ChangeIndex::default();
        index.merge(vec![key("2023-01-01-05"), key("2023-01-01-03")]);
        index.merge(vec![key("2023-01-01-04"), key("2023-01-01-03")]);

        let rendered: Vec<&str> = index.entries().iter().map(PartitionKey::as_str).collect();
        assert_eq!(
            rendered,
            vec!["2023-01-01-03", "2023-01-01-04", "2023-01-01-05"]
        );
    }

    #[tokio::test]
    async fn test_save_is_newline_joined_without_trailing_blank() {
        let store = MemoryBlobStore::new();
        let mut index = ChangeIndex::default();
        index.merge(vec![key("2023-01-01-01"), key("2023-01-01-00")]);
        index.save(&store).await.unwrap();

        let body = store.get(INDEX_BLOB).await.unwrap().unwrap();
        assert_eq!(body, b"2023-01-01-00\n2023-01-01-01");
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let store = MemoryBlobStore::new();
        let mut index = ChangeIndex::default();
        index.merge(vec![key("2023-01-02-00"), key("2023-01-01-23")]);
        index.save(&store).await.unwrap();

        let reloaded = ChangeIndex::load(&store).await.unwrap();
        assert_eq!(reloaded, index);
    }

    #[test]
    fn test_partition_blob_key() {
        assert_eq!(partition_blob_key(&key("2023-01-01-00")), "changes/2023-01-01-00");
    }
}
