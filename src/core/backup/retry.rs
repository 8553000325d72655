//! Bounded retry around the batch drain
//!
//! Transient infrastructure faults (connection loss, execution
//! timeout, throttling) get a short fixed backoff schedule; everything
//! else propagates untouched. The cursor keeps its position between
//! attempts, so a retry resumes from the failed page rather than
//! restarting the query.

use crate::adapters::source::ChangeCursor;
use crate::core::backup::batch::BatchProcessor;
use crate::core::index::ChangeIndex;
use crate::domain::Result;
use std::time::Duration;

/// Backoff schedule for transient faults
///
/// N delays allow N + 1 attempts in total.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Build a policy from delays in milliseconds.
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self {
            delays: delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        }
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for RetryPolicy {
    /// 1s, 3s, 9s.
    fn default() -> Self {
        Self::from_millis(&[1_000, 3_000, 9_000])
    }
}

/// Drain the cursor through the processor, retrying transient faults.
///
/// Exhausting the schedule surfaces the last error; non-transient
/// errors are returned from the first occurrence.
pub async fn drain_with_retry(
    policy: &RetryPolicy,
    processor: &BatchProcessor,
    cursor: &mut dyn ChangeCursor,
    index: &mut ChangeIndex,
) -> Result<()> {
    let mut attempt = 0;

    loop {
        match processor.process(cursor, index).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < policy.delays.len() => {
                let delay = policy.delays[attempt];
                attempt += 1;
                tracing::error!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts(),
                    delay_secs = delay.as_secs_f64(),
                    error = %e,
                    "Retrying batch drain after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
