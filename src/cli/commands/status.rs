//! Status command implementation
//!
//! Loads the change index from blob storage and reports the resume
//! point the next run would start from.

use crate::adapters::blob::AzureBlobStore;
use crate::config::load_config;
use crate::core::index::ChangeIndex;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print every indexed partition, not just the tail
    #[arg(long)]
    pub full: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let store = AzureBlobStore::new(&config.storage)?;
        let index = ChangeIndex::load(&store).await?;

        if index.is_empty() {
            println!("No change index yet: the next run will bootstrap from scratch");
            return Ok(0);
        }

        println!("Indexed partitions: {}", index.len());
        if self.full {
            for entry in index.entries() {
                println!("  {entry}");
            }
        }
        if let Some(tail) = index.last() {
            println!(
                "Next run resumes from {} ({})",
                tail,
                tail.hour_start()?.to_rfc3339()
            );
        }

        Ok(0)
    }
}
