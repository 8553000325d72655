//! Source collection abstraction
//!
//! The source database is an external collaborator; the pipeline only
//! depends on these two traits. Pages must arrive in ascending
//! last-modified order: the change index's ascending-partition
//! invariant rests on the cursor honoring the server-side sort.

use crate::core::backup::window::QueryWindow;
use crate::domain::{ChangeRecord, Result};
use async_trait::async_trait;

/// A queryable collection of change records
#[async_trait]
pub trait SourceCollection: Send + Sync {
    /// Open a paginated, time-ordered cursor over the documents whose
    /// last-modified timestamp falls inside `window`.
    async fn open_changes(
        &self,
        window: &QueryWindow,
        batch_size: usize,
    ) -> Result<Box<dyn ChangeCursor>>;
}

/// A streaming cursor over query results
///
/// `next_page` yields bounded batches until the cursor is exhausted;
/// errors at this level are page-level faults handled by the retry
/// wrapper, and the cursor retains its position across a retried call.
#[async_trait]
pub trait ChangeCursor: Send {
    /// Pull the next page, or `None` when the cursor is exhausted.
    async fn next_page(&mut self) -> Result<Option<Vec<ChangeRecord>>>;
}
