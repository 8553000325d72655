//! Init command implementation
//!
//! Writes a commented starter configuration file.

use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "strata.toml")]
    pub output: String,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

const TEMPLATE: &str = r#"# strata configuration
#
# Secrets should come from the environment via ${VAR} substitution,
# never from literals checked into version control.

[application]
log_level = "info"
dry_run = false

[source]
endpoint = "https://your-account.documents.azure.com:443/"
key = "${STRATA_SOURCE_KEY}"
database = "registry"
container = "definitions"
partition_value = "definitions"
batch_size = 1000
# Bulky top-level fields dropped before mirroring
exclude_fields = ["_mongo", "coordinates"]

[storage]
endpoint = "https://your-account.blob.core.windows.net"
container = "backups"
tenant_id = "${STRATA_STORAGE_TENANT_ID}"
client_id = "${STRATA_STORAGE_CLIENT_ID}"
client_secret = "${STRATA_STORAGE_CLIENT_SECRET}"

[backup]
max_concurrency = 16
retry_backoff_ms = [1000, 3000, 9000]

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let path = Path::new(&self.output);

        if path.exists() && !self.force {
            eprintln!(
                "{} already exists; pass --force to overwrite",
                path.display()
            );
            return Ok(2);
        }

        std::fs::write(path, TEMPLATE)?;
        println!("Wrote starter configuration to {}", path.display());
        println!("Set the ${{STRATA_*}} environment variables before running");

        Ok(0)
    }
}
