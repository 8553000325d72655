//! Per-run changeset accumulation
//!
//! Workers mirror documents concurrently but funnel every result
//! through [`ChangeSetAccumulator`], the only shared mutable state in
//! the hot path. The bucket append and the progress counter move
//! together inside one critical section so concurrent writers cannot
//! lose updates to a partition's list.

use crate::domain::{BlobName, PartitionKey};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Blob names produced during the current run, grouped by partition
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    partitions: BTreeMap<PartitionKey, Vec<BlobName>>,
}

impl ChangeSet {
    /// The partition buckets, ascending by key.
    pub fn partitions(&self) -> &BTreeMap<PartitionKey, Vec<BlobName>> {
        &self.partitions
    }

    /// Partition keys in this changeset, ascending.
    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.partitions.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Render one partition's change list for upload.
    pub fn render_partition(names: &[BlobName]) -> String {
        names
            .iter()
            .map(BlobName::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Synchronized changeset shared by concurrent record workers
#[derive(Debug, Default)]
pub struct ChangeSetAccumulator {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    changes: ChangeSet,
    mirrored: u64,
}

impl ChangeSetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one mirrored document under its partition.
    pub fn record(&self, partition: PartitionKey, name: BlobName) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .changes
            .partitions
            .entry(partition)
            .or_default()
            .push(name);
        inner.mirrored += 1;
    }

    /// Documents mirrored so far this run.
    pub fn mirrored(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).mirrored
    }

    /// A point-in-time copy of the accumulated changeset.
    ///
    /// The flush cycle uploads from this copy while workers for the
    /// next page are free to keep appending.
    pub fn snapshot(&self) -> ChangeSet {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .changes
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(s: &str) -> PartitionKey {
        PartitionKey::parse(s).unwrap()
    }

    fn name(s: &str) -> BlobName {
        BlobName::from_identifier(s).unwrap()
    }

    #[test]
    fn test_record_groups_by_partition() {
        let acc = ChangeSetAccumulator::new();
        acc.record(key("2023-01-02-00"), name("npm/npmjs/-/a/1.0.0"));
        acc.record(key("2023-01-02-00"), name("npm/npmjs/-/b/2.0.0"));
        acc.record(key("2023-01-02-01"), name("npm/npmjs/-/c/3.0.0"));

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.partitions().len(), 2);
        assert_eq!(snapshot.partitions()[&key("2023-01-02-00")].len(), 2);
        assert_eq!(acc.mirrored(), 3);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let acc = ChangeSetAccumulator::new();
        acc.record(key("2023-01-02-00"), name("npm/npmjs/-/a/1.0.0"));

        let snapshot = acc.snapshot();
        acc.record(key("2023-01-02-00"), name("npm/npmjs/-/b/2.0.0"));

        assert_eq!(snapshot.partitions()[&key("2023-01-02-00")].len(), 1);
        assert_eq!(acc.snapshot().partitions()[&key("2023-01-02-00")].len(), 2);
    }

    #[test]
    fn test_render_partition_is_newline_joined() {
        let names = vec![name("npm/npmjs/-/a/1.0.0"), name("npm/npmjs/-/b/2.0.0")];
        assert_eq!(
            ChangeSet::render_partition(&names),
            "npm/npmjs/-/a/1.0.0.json\nnpm/npmjs/-/b/2.0.0.json"
        );
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let acc = Arc::new(ChangeSetAccumulator::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let acc = Arc::clone(&acc);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    acc.record(
                        key("2023-01-02-00"),
                        name(&format!("npm/npmjs/-/pkg{t}/{i}.0.0")),
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.mirrored(), 800);
        assert_eq!(acc.snapshot().partitions()[&key("2023-01-02-00")].len(), 800);
    }
}
