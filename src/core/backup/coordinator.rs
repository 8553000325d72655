//! Backup coordinator - orchestrates one mirroring run
//!
//! Wires the source and storage backends from configuration, computes
//! the query window from the persisted index, and drives the
//! retry-wrapped batch drain. The coordinator itself is stateless
//! across runs; every piece of resumability state lives in the change
//! index blob. Concurrent runs against the same index are not
//! supported and must be prevented by the deployment.

use crate::adapters::blob::{AzureBlobStore, BlobStore, MemoryBlobStore};
use crate::adapters::source::{CosmosSource, SourceCollection};
use crate::config::StrataConfig;
use crate::core::backup::batch::{BatchConfig, BatchProcessor};
use crate::core::backup::retry::{drain_with_retry, RetryPolicy};
use crate::core::backup::summary::RunSummary;
use crate::core::backup::window::QueryWindow;
use crate::core::index::ChangeIndex;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Backup coordinator
pub struct BackupCoordinator {
    source: Arc<dyn SourceCollection>,
    store: Arc<dyn BlobStore>,
    batch_size: usize,
    batch_config: BatchConfig,
    retry_policy: RetryPolicy,
}

impl BackupCoordinator {
    /// Create a coordinator with backends built from configuration.
    ///
    /// Under `application.dry_run` the destination is an in-memory
    /// store, so a run can be rehearsed without touching the
    /// container.
    pub fn new(config: &StrataConfig) -> Result<Self> {
        let source: Arc<dyn SourceCollection> =
            Arc::new(CosmosSource::new(config.source.clone())?);

        let store: Arc<dyn BlobStore> = if config.application.dry_run {
            tracing::warn!("Dry run enabled: writes go to an in-memory store");
            Arc::new(MemoryBlobStore::new())
        } else {
            Arc::new(AzureBlobStore::new(&config.storage)?)
        };

        Ok(Self::with_backends(
            source,
            store,
            config.source.batch_size,
            BatchConfig {
                max_concurrency: config.backup.max_concurrency,
            },
            RetryPolicy::from_millis(&config.backup.retry_backoff_ms),
        ))
    }

    /// Create a coordinator over explicit backends.
    pub fn with_backends(
        source: Arc<dyn SourceCollection>,
        store: Arc<dyn BlobStore>,
        batch_size: usize,
        batch_config: BatchConfig,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            store,
            batch_size,
            batch_config,
            retry_policy,
        }
    }

    /// Execute one backup run.
    ///
    /// 1. Load the change index (fatal if it cannot be read).
    /// 2. Compute the query window from the index tail and `now`.
    /// 3. Open the time-ordered change query.
    /// 4. Drain it through the retry-wrapped batch processor.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let started = Instant::now();

        let mut index = ChangeIndex::load(self.store.as_ref()).await?;
        let window = QueryWindow::compute(index.last(), now)?;

        match &window {
            QueryWindow::Bootstrap => {
                tracing::info!("Starting backup run: bootstrap, no lower time bound");
            }
            QueryWindow::CatchUp { lower, upper } => {
                tracing::info!(
                    lower = %lower,
                    upper = %upper,
                    indexed_partitions = index.len(),
                    "Starting backup run"
                );
            }
        }

        let mut cursor = self.source.open_changes(&window, self.batch_size).await?;
        let processor = BatchProcessor::new(self.store.clone(), self.batch_config.clone());

        drain_with_retry(
            &self.retry_policy,
            &processor,
            cursor.as_mut(),
            &mut index,
        )
        .await?;

        let summary = processor.into_summary(started.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
