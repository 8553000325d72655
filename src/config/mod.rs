//! Configuration management for strata.
//!
//! TOML-based configuration with environment variable substitution
//! (`${VAR_NAME}`), `STRATA_*` overrides, defaults for everything
//! tunable, and validation on load. The resulting [`StrataConfig`] is
//! constructed once at startup and passed into the coordinator.
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [source]
//! endpoint = "https://account.documents.azure.com:443/"
//! key = "${STRATA_SOURCE_KEY}"
//! database = "registry"
//! container = "definitions"
//! partition_value = "definitions"
//! batch_size = 1000
//!
//! [storage]
//! endpoint = "https://account.blob.core.windows.net"
//! container = "backups"
//! tenant_id = "${STRATA_STORAGE_TENANT_ID}"
//! client_id = "${STRATA_STORAGE_CLIENT_ID}"
//! client_secret = "${STRATA_STORAGE_CLIENT_SECRET}"
//!
//! [backup]
//! max_concurrency = 16
//! retry_backoff_ms = [1000, 3000, 9000]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, BackupConfig, LoggingConfig, SourceConfig, StorageConfig, StrataConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
