//! Core business logic for strata.
//!
//! # Modules
//!
//! - [`backup`] - window computation, batch processing, retry, and
//!   run orchestration
//! - [`index`] - the durable change index that makes runs resumable
//!
//! # Run Workflow
//!
//! 1. **Load index**: read `changes/index` (empty on the first run)
//! 2. **Compute window**: `[index tail, start of current hour)`, or
//!    unbounded on bootstrap
//! 3. **Query source**: time-ordered pages of changed documents
//! 4. **Mirror**: upload each document body under its derived blob name
//! 5. **Flush**: write per-partition change lists, then extend and
//!    persist the index
//! 6. **Report**: log the run summary

pub mod backup;
pub mod index;
