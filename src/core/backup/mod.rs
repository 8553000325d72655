//! Backup pipeline: window computation, batch processing, retry,
//! orchestration.

pub mod batch;
pub mod changeset;
pub mod coordinator;
pub mod retry;
pub mod summary;
pub mod window;

pub use batch::{BatchConfig, BatchProcessor};
pub use changeset::{ChangeSet, ChangeSetAccumulator};
pub use coordinator::BackupCoordinator;
pub use retry::{drain_with_retry, RetryPolicy};
pub use summary::RunSummary;
pub use window::QueryWindow;
