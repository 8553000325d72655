//! Batch processing for the mirroring pipeline
//!
//! Consumes the change cursor page by page. Within a page, documents
//! are mirrored concurrently; after a page, the accumulated changeset
//! partitions are flushed and the change index is extended. The flush
//! order is load-bearing: partition change lists must be durably
//! written before the merged index is persisted, so the index never
//! points past data that was not actually flushed.

use crate::adapters::blob::BlobStore;
use crate::adapters::source::ChangeCursor;
use crate::core::backup::changeset::{ChangeSet, ChangeSetAccumulator};
use crate::core::backup::summary::RunSummary;
use crate::core::index::{partition_blob_key, ChangeIndex};
use crate::domain::{BlobName, ChangeRecord, PartitionKey, Result};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum records mirrored concurrently within a page
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
        }
    }
}

/// Outcome of handling a single record
///
/// A skip is an expected, non-fatal result; the record is dropped from
/// this run's changeset and will only reappear if a later run's query
/// window still covers it.
#[derive(Debug)]
enum RecordOutcome {
    Mirrored {
        partition: PartitionKey,
        name: BlobName,
    },
    Skipped {
        reason: String,
    },
}

/// Page-loop worker owning one run's mutable processing state
pub struct BatchProcessor {
    store: Arc<dyn BlobStore>,
    config: BatchConfig,
    changes: ChangeSetAccumulator,
    skipped: AtomicU64,
    pages: AtomicU64,
}

impl BatchProcessor {
    /// Create a processor for one run.
    pub fn new(store: Arc<dyn BlobStore>, config: BatchConfig) -> Self {
        Self {
            store,
            config,
            changes: ChangeSetAccumulator::new(),
            skipped: AtomicU64::new(0),
            pages: AtomicU64::new(0),
        }
    }

    /// Drain the cursor, mirroring every processable record.
    ///
    /// Pages are consumed strictly in cursor order; records within a
    /// page are processed concurrently with no relative ordering. The
    /// cursor keeps its position on error, so a retried call resumes
    /// where the failure happened.
    pub async fn process(
        &self,
        cursor: &mut dyn ChangeCursor,
        index: &mut ChangeIndex,
    ) -> Result<()> {
        while let Some(page) = cursor.next_page().await? {
            self.pages.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(page_size = page.len(), "Processing page");

            stream::iter(page)
                .for_each_concurrent(self.config.max_concurrency, |record| async move {
                    match self.mirror_record(&record).await {
                        Ok(RecordOutcome::Mirrored { partition, name }) => {
                            self.changes.record(partition, name);
                        }
                        Ok(RecordOutcome::Skipped { reason }) => {
                            tracing::warn!(reason = %reason, "Skipping document");
                            self.skipped.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            tracing::warn!(
                                document = record.id().unwrap_or("<no id>"),
                                error = %e,
                                "Failed to mirror document, skipping"
                            );
                            self.skipped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
                .await;

            let snapshot = self.changes.snapshot();
            if !snapshot.is_empty() {
                self.flush(&snapshot, index).await?;
                tracing::info!(
                    mirrored = self.changes.mirrored(),
                    "Documents saved to blob storage"
                );
            }
        }

        Ok(())
    }

    /// Mirror one record: derive names, upload the body.
    async fn mirror_record(&self, record: &ChangeRecord) -> Result<RecordOutcome> {
        let Some(name) = record.blob_name() else {
            return Ok(RecordOutcome::Skipped {
                reason: "document has no usable identifier".to_string(),
            });
        };

        let partition = match record.partition_key() {
            Ok(partition) => partition,
            Err(e) => {
                return Ok(RecordOutcome::Skipped {
                    reason: e.to_string(),
                })
            }
        };

        self.store.put(name.as_str(), record.to_bytes()?).await?;

        Ok(RecordOutcome::Mirrored { partition, name })
    }

    /// Flush the changeset: partition change lists first, then the
    /// merged index.
    async fn flush(&self, snapshot: &ChangeSet, index: &mut ChangeIndex) -> Result<()> {
        let uploads = snapshot.partitions().iter().map(|(partition, names)| {
            let body = ChangeSet::render_partition(names).into_bytes();
            let key = partition_blob_key(partition);
            async move { self.store.put(&key, body).await }
        });

        // Every partition list must land before the index is extended
        for outcome in futures::future::join_all(uploads).await {
            outcome?;
        }

        index.merge(snapshot.keys().cloned());
        index.save(self.store.as_ref()).await
    }

    /// Fold the processing counters into a run summary.
    pub fn into_summary(self, duration: Duration) -> RunSummary {
        let snapshot = self.changes.snapshot();
        RunSummary {
            pages: self.pages.load(Ordering::Relaxed),
            mirrored: self.changes.mirrored(),
            skipped: self.skipped.load(Ordering::Relaxed),
            partitions_flushed: snapshot.partitions().len(),
            duration,
        }
    }
}
