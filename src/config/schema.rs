//! Configuration schema types
//!
//! The root [`StrataConfig`] maps to the `strata.toml` file. The
//! struct is built once at startup and passed into the coordinator;
//! nothing reads the process environment after loading.

use crate::config::SecretString;
use serde::Deserialize;

/// Main strata configuration
#[derive(Debug, Deserialize)]
pub struct StrataConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source collection connection and query settings
    pub source: SourceConfig,

    /// Destination blob container settings
    pub storage: StorageConfig,

    /// Backup run tuning
    #[serde(default)]
    pub backup: BackupConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StrataConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.storage.validate()?;
        self.backup.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode: route all writes to an in-memory store
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Source collection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Cosmos account endpoint, e.g. `https://account.documents.azure.com:443/`
    pub endpoint: String,

    /// Account key
    pub key: SecretString,

    /// Database name
    pub database: String,

    /// Container holding the mirrored collection
    pub container: String,

    /// Logical partition the collection lives in
    pub partition_value: String,

    /// Page size for the change query
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Bulky top-level fields dropped before mirroring
    #[serde(default = "default_exclude_fields")]
    pub exclude_fields: Vec<String>,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("source.endpoint must not be empty".to_string());
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("source.endpoint is not a valid URL: {e}"))?;
        if self.database.is_empty() {
            return Err("source.database must not be empty".to_string());
        }
        if self.container.is_empty() {
            return Err("source.container must not be empty".to_string());
        }
        if self.batch_size == 0 || self.batch_size > 5000 {
            return Err(format!(
                "source.batch_size must be between 1 and 5000, got {}",
                self.batch_size
            ));
        }
        Ok(())
    }
}

/// Destination blob container configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Blob service endpoint, e.g. `https://account.blob.core.windows.net`
    pub endpoint: String,

    /// Container every object is written into
    pub container: String,

    /// Azure AD tenant for the client credentials flow
    pub tenant_id: String,

    /// Azure AD application (client) id
    pub client_id: String,

    /// Azure AD client secret
    pub client_secret: SecretString,

    /// Per-request network timeout
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("storage.endpoint must not be empty".to_string());
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("storage.endpoint is not a valid URL: {e}"))?;
        if self.container.is_empty() {
            return Err("storage.container must not be empty".to_string());
        }
        if self.tenant_id.is_empty() || self.client_id.is_empty() {
            return Err(
                "storage.tenant_id and storage.client_id are required for AD authentication"
                    .to_string(),
            );
        }
        if self.request_timeout_seconds == 0 {
            return Err("storage.request_timeout_seconds must be positive".to_string());
        }
        Ok(())
    }
}

/// Backup run tuning
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Records mirrored concurrently within a page
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Backoff schedule for transient cursor faults, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: Vec<u64>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl BackupConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("backup.max_concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Enable rotating JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory log files are written into
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path must not be empty when file logging is enabled"
                .to_string());
        }
        if !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be daily or hourly",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_exclude_fields() -> Vec<String> {
    vec!["_mongo".to_string(), "coordinates".to_string()]
}

fn default_request_timeout_seconds() -> u64 {
    100
}

fn default_max_concurrency() -> usize {
    16
}

fn default_retry_backoff_ms() -> Vec<u64> {
    vec![1_000, 3_000, 9_000]
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
