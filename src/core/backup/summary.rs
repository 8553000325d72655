//! Run summary and reporting

use std::time::Duration;

/// Summary of one backup run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Pages pulled from the change cursor
    pub pages: u64,

    /// Documents mirrored to blob storage
    pub mirrored: u64,

    /// Documents skipped (missing identifier, bad timestamp, failed upload)
    pub skipped: u64,

    /// Distinct partitions flushed this run
    pub partitions_flushed: usize,

    /// Duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Whether every retrieved document was mirrored.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }

    /// Log the summary.
    pub fn log_summary(&self) {
        tracing::info!(
            pages = self.pages,
            mirrored = self.mirrored,
            skipped = self.skipped,
            partitions = self.partitions_flushed,
            duration_secs = self.duration.as_secs(),
            "Backup run completed"
        );

        if self.skipped > 0 {
            tracing::warn!(
                skipped = self.skipped,
                "Some documents were skipped; they will be retried only if a \
                 future query window still covers them"
            );
        }
    }
}
