//! Change records and the names derived from them
//!
//! A [`ChangeRecord`] is one source document as retrieved from the
//! database. Two values are derived from it: the [`BlobName`] the
//! mirrored document is stored under, and the hour-granularity
//! [`PartitionKey`] it is indexed under. Both derivations are pure.

use crate::domain::{Result, StrataError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Document field holding the unique identifier.
pub const ID_FIELD: &str = "_id";

/// Document field holding the last-modified metadata.
pub const META_FIELD: &str = "_meta";

/// Metadata sub-field holding the last-modified timestamp.
pub const UPDATED_FIELD: &str = "updated";

/// Hour-granularity partition key format.
pub const PARTITION_KEY_FORMAT: &str = "%Y-%m-%d-%H";

/// Destination object key for a mirrored document
///
/// Derived from the record identifier: lower-cased, trimmed, suffixed
/// with `.json`. Non-empty for any record with a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobName(String);

impl BlobName {
    /// Derive a blob name from a raw document identifier.
    ///
    /// Returns `None` when the identifier is empty or whitespace-only,
    /// which marks the record unprocessable; the caller skips it.
    pub fn from_identifier(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        Some(Self(format!("{}.json", id.to_lowercase())))
    }

    /// Returns the blob name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BlobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hour-granularity time bucket
///
/// Used both as a changeset grouping key and as a change index entry.
/// The string form (`2023-01-02-05`) sorts chronologically, so index
/// entries stay ascending under plain string ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Bucket a UTC timestamp at hour granularity.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self(ts.format(PARTITION_KEY_FORMAT).to_string())
    }

    /// Parse an index entry back into a partition key.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not match the
    /// year-month-day-hour format.
    pub fn parse(s: &str) -> Result<Self> {
        // Round-trip through hour_start to validate the format
        let key = Self(s.to_string());
        key.hour_start()?;
        Ok(key)
    }

    /// The UTC instant this partition starts at.
    ///
    /// This is the inclusive lower bound the next run queries from
    /// when this key is the index tail.
    pub fn hour_start(&self) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(&format!("{}:00", self.0), "%Y-%m-%d-%H:%M")
            .map_err(|e| {
                StrataError::Index(format!("malformed partition key '{}': {e}", self.0))
            })?;
        Ok(Utc.from_utc_datetime(&naive))
    }

    /// Returns the partition key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One source document, immutable once read
///
/// Ownership transfers from the source adapter to the pipeline for the
/// duration of processing.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    body: Value,
}

impl ChangeRecord {
    /// Wrap a raw document.
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The raw document body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The document identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.body.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Derive the destination blob name for this record.
    ///
    /// `None` means the record has no usable identifier and must be
    /// skipped, not fatally failed.
    pub fn blob_name(&self) -> Option<BlobName> {
        BlobName::from_identifier(self.id()?)
    }

    /// The record's last-modified timestamp (`_meta.updated`).
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or unparsable; such a
    /// record is excluded from the batch by the caller.
    pub fn updated_at(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .body
            .get(META_FIELD)
            .and_then(|meta| meta.get(UPDATED_FIELD))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StrataError::Record(format!(
                    "document {} has no {META_FIELD}.{UPDATED_FIELD} field",
                    self.id().unwrap_or("<no id>")
                ))
            })?;

        DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                StrataError::Record(format!(
                    "document {} has unparsable {META_FIELD}.{UPDATED_FIELD} '{raw}': {e}",
                    self.id().unwrap_or("<no id>")
                ))
            })
    }

    /// Derive the hour-granularity partition key for this record.
    pub fn partition_key(&self) -> Result<PartitionKey> {
        Ok(PartitionKey::from_timestamp(self.updated_at()?))
    }

    /// Serialize the full record body for upload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.body)?)
    }
}
