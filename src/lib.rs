// strata - Incremental Cosmos DB to Azure Blob Storage Mirroring
// Copyright (c) 2025 Strata Contributors
// Licensed under the MIT License

//! # strata - Incremental Backup to Blob Storage
//!
//! strata mirrors documents that changed in a Cosmos DB collection
//! since the last successful run into Azure Blob Storage, one blob per
//! document, and maintains a compact hour-partitioned change index
//! that makes every run resumable.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (batch processing, change index, retry,
//!   orchestration)
//! - [`adapters`] - External integrations (source collection, blob
//!   storage)
//! - [`domain`] - Core domain types and derivations
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strata::config::load_config;
//! use strata::core::backup::BackupCoordinator;
//! use chrono::Utc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("strata.toml")?;
//!     let coordinator = BackupCoordinator::new(&config)?;
//!     let summary = coordinator.run(Utc::now()).await?;
//!     println!("Mirrored {} documents", summary.mirrored);
//!     Ok(())
//! }
//! ```
//!
//! ## Resumability
//!
//! The persisted change index (`changes/index`) is the only state kept
//! between runs: a sorted, deduplicated list of hour-granularity
//! partition keys. Its last entry is the lower time bound of the next
//! run's query, and the in-progress hour is always excluded from the
//! upper bound, so documents still being written upstream are never
//! captured mid-mutation.
//!
//! ## Failure model
//!
//! A single bad document (missing identifier, malformed timestamp,
//! failed upload) is logged and skipped; transient cursor faults are
//! retried on a short backoff schedule; index read/write failures are
//! fatal. Partition change lists are always written before the index
//! is extended, so the index never points past data that was not
//! actually flushed.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
