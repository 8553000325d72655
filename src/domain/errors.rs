//! Domain error types
//!
//! The error hierarchy for strata. All errors are domain-specific and
//! don't expose third-party types in public signatures.

use thiserror::Error;

/// Main strata error type
///
/// This is the primary error type used throughout the application.
/// It wraps the subsystem error types and carries the transience
/// classification used by the retry wrapper.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source collection errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Blob storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Change index load/save errors. Never retried: the pipeline must
    /// not proceed without certainty about prior progress.
    #[error("Change index error: {0}")]
    Index(String),

    /// Per-record derivation errors
    #[error("Record error: {0}")]
    Record(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl StrataError {
    /// Whether this error belongs to the closed set of transient
    /// infrastructure faults the retry wrapper is allowed to retry.
    pub fn is_transient(&self) -> bool {
        match self {
            StrataError::Source(e) => matches!(
                e,
                SourceError::ConnectionFailed(_)
                    | SourceError::ExecutionTimeout(_)
                    | SourceError::Timeout(_)
            ),
            StrataError::Storage(e) => matches!(
                e,
                StorageError::ConnectionFailed(_)
                    | StorageError::Timeout(_)
                    | StorageError::Throttled(_)
            ),
            _ => false,
        }
    }
}

/// Source collection errors
///
/// Errors that occur when querying the source database. The first
/// three variants are the transient kinds the retry wrapper handles.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the source database
    #[error("Failed to connect to source: {0}")]
    ConnectionFailed(String),

    /// Server-side query execution timed out
    #[error("Query execution timeout: {0}")]
    ExecutionTimeout(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Invalid response from the source
    #[error("Invalid response from source: {0}")]
    InvalidResponse(String),
}

/// Blob storage errors
///
/// Errors that occur when interacting with the blob store. These don't
/// expose the HTTP client types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to reach the storage endpoint
    #[error("Failed to connect to blob storage: {0}")]
    ConnectionFailed(String),

    /// Authentication/authorization failed
    #[error("Storage authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Failed to upload a blob
    #[error("Failed to upload blob {name}: {message}")]
    UploadFailed { name: String, message: String },

    /// Failed to download a blob
    #[error("Failed to download blob {name}: {message}")]
    DownloadFailed { name: String, message: String },

    /// Request rate too large (429)
    #[error("Request throttled: {0}")]
    Throttled(String),

    /// Request timeout
    #[error("Storage request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for StrataError {
    fn from(err: toml::de::Error) -> Self {
        StrataError::Configuration(format!("TOML parse error: {err}"))
    }
}
