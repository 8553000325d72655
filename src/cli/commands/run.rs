//! Run command implementation
//!
//! Executes one backup run against the configured source and
//! destination. All resumability state lives in the change index, so
//! the command takes no positional state of its own.

use crate::config::load_config;
use crate::core::backup::BackupCoordinator;
use chrono::Utc;
use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dry run mode - route all writes to an in-memory store
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = load_config(config_path)?;

        if self.dry_run {
            config.application.dry_run = true;
        }

        let coordinator = BackupCoordinator::new(&config)?;
        let summary = coordinator.run(Utc::now()).await?;

        println!(
            "Mirrored {} document(s) across {} partition(s) in {} page(s) ({} skipped)",
            summary.mirrored, summary.partitions_flushed, summary.pages, summary.skipped
        );

        Ok(0)
    }
}
