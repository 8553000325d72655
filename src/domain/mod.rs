//! Domain models and types for strata.
//!
//! The domain layer provides:
//! - **Change records and derived names** ([`ChangeRecord`],
//!   [`BlobName`], [`PartitionKey`])
//! - **Error types** ([`StrataError`], [`SourceError`], [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! Identifier-like values use the newtype pattern so a blob name can
//! never be handed to an API expecting a partition key:
//!
//! ```rust
//! use strata::domain::{BlobName, PartitionKey};
//!
//! let name = BlobName::from_identifier("NPM/npmjs/-/Lodash/4.17.21").unwrap();
//! assert_eq!(name.as_str(), "npm/npmjs/-/lodash/4.17.21.json");
//!
//! let key = PartitionKey::parse("2023-01-02-05").unwrap();
//! assert_eq!(key.as_str(), "2023-01-02-05");
//! ```

pub mod errors;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{SourceError, StorageError, StrataError};
pub use record::{BlobName, ChangeRecord, PartitionKey};
pub use result::Result;
