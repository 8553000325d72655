//! Query window computation
//!
//! The window is derived from the change index tail and the wall
//! clock, never stored. The pipeline has exactly two logical states:
//! bootstrap (empty index, unbounded presence-only filter) and
//! catching up (half-open `[index tail, start of current hour)`
//! range). The upper bound excludes the in-progress hour so documents
//! still being written upstream are never captured mid-mutation.

use crate::domain::{PartitionKey, Result, StrataError};
use chrono::{DateTime, Duration, DurationRound, Utc};

/// Time filter for one run's source query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryWindow {
    /// First run: no index yet, query everything carrying the
    /// last-modified metadata field.
    Bootstrap,
    /// Resuming: half-open range from the last indexed partition to
    /// the start of the current hour.
    CatchUp {
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    },
}

impl QueryWindow {
    /// Compute the window for a run starting at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index tail is malformed; the run must
    /// not guess at a resume point.
    pub fn compute(index_tail: Option<&PartitionKey>, now: DateTime<Utc>) -> Result<Self> {
        match index_tail {
            None => Ok(Self::Bootstrap),
            Some(tail) => Ok(Self::CatchUp {
                lower: tail.hour_start()?,
                upper: start_of_hour(now)?,
            }),
        }
    }
}

/// Truncate a timestamp to the start of its hour.
pub fn start_of_hour(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    now.duration_trunc(Duration::hours(1))
        .map_err(|e| StrataError::Other(format!("failed to truncate {now} to the hour: {e}")))
}
