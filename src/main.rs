// strata - Incremental Cosmos DB to Azure Blob Storage Mirroring
// Copyright (c) 2025 Strata Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use strata::cli::{Cli, Commands};
use strata::config::{load_config, LoggingConfig};
use strata::logging::init_logging;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; a
    // broken or absent config still gets console logging so the
    // failure itself is visible.
    let (config_log_level, logging_config) = match load_config(&cli.config) {
        Ok(config) => (config.application.log_level.clone(), config.logging),
        Err(_) => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&config_log_level);

    let _guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "strata - incremental backup to blob storage"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
