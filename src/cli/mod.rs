//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for strata using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// strata - incremental Cosmos DB to Azure Blob Storage mirroring
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
#[command(author = "Strata Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "strata.toml", env = "STRATA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STRATA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one backup run
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the change index and the resume point
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
