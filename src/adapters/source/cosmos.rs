//! Cosmos DB source collection
//!
//! Opens time-ordered SQL queries against the mirrored collection and
//! adapts the SDK's item feed into the page-granular cursor contract.

use crate::adapters::source::traits::{ChangeCursor, SourceCollection};
use crate::config::SourceConfig;
use crate::core::backup::window::QueryWindow;
use crate::domain::record::{META_FIELD, UPDATED_FIELD};
use crate::domain::{ChangeRecord, Result, SourceError, StrataError};
use async_trait::async_trait;
use azure_data_cosmos::clients::ContainerClient;
use azure_data_cosmos::PartitionKey as CosmosPartitionKey;
use chrono::SecondsFormat;
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;

type ItemStream = Pin<Box<dyn Stream<Item = azure_core::Result<Value>> + Send>>;

/// Cosmos DB-backed [`SourceCollection`]
pub struct CosmosSource {
    container: ContainerClient,
    config: SourceConfig,
}

impl CosmosSource {
    /// Create a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Cosmos client cannot be created.
    pub fn new(config: SourceConfig) -> Result<Self> {
        use secrecy::ExposeSecret;

        let key = azure_core::credentials::Secret::new(config.key.expose_secret().to_string());
        let options = Some(azure_data_cosmos::CosmosClientOptions::default());

        let client = azure_data_cosmos::CosmosClient::with_key(&config.endpoint, key, options)
            .map_err(|e| {
                StrataError::Source(SourceError::ConnectionFailed(format!(
                    "Failed to create Cosmos client: {e}"
                )))
            })?;

        let container = client
            .database_client(&config.database)
            .container_client(&config.container);

        Ok(Self { container, config })
    }

    /// Render the SQL filter for a window.
    ///
    /// Bounds are RFC 3339 UTC strings; `_meta.updated` values compare
    /// correctly as plain strings in that form. The ascending sort is
    /// what lets index partitions only ever extend forward in time.
    pub fn render_query(window: &QueryWindow) -> String {
        let updated = format!("c.{META_FIELD}.{UPDATED_FIELD}");
        match window {
            QueryWindow::Bootstrap => format!(
                "SELECT * FROM c WHERE IS_DEFINED(c.{META_FIELD}) ORDER BY {updated} ASC"
            ),
            QueryWindow::CatchUp { lower, upper } => format!(
                "SELECT * FROM c WHERE IS_DEFINED(c.{META_FIELD}) \
                 AND {updated} >= \"{}\" AND {updated} < \"{}\" ORDER BY {updated} ASC",
                lower.to_rfc3339_opts(SecondsFormat::Secs, true),
                upper.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        }
    }
}

#[async_trait]
impl SourceCollection for CosmosSource {
    async fn open_changes(
        &self,
        window: &QueryWindow,
        batch_size: usize,
    ) -> Result<Box<dyn ChangeCursor>> {
        let query = Self::render_query(window);
        tracing::info!(query = %query, "Opening change query");

        let pager = self
            .container
            .query_items::<Value>(
                query,
                CosmosPartitionKey::from(self.config.partition_value.clone()),
                None,
            )
            .map_err(|e| {
                StrataError::Source(SourceError::QueryFailed(format!(
                    "Failed to open change query: {e}"
                )))
            })?;

        Ok(Box::new(CosmosCursor {
            items: Box::pin(pager),
            batch_size,
            exclude_fields: self.config.exclude_fields.clone(),
            exhausted: false,
        }))
    }
}

/// Page-assembling cursor over the SDK's item feed
struct CosmosCursor {
    items: ItemStream,
    batch_size: usize,
    exclude_fields: Vec<String>,
    exhausted: bool,
}

#[async_trait]
impl ChangeCursor for CosmosCursor {
    async fn next_page(&mut self) -> Result<Option<Vec<ChangeRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut page = Vec::with_capacity(self.batch_size);
        while page.len() < self.batch_size {
            match self.items.next().await {
                Some(Ok(doc)) => {
                    page.push(ChangeRecord::new(strip_fields(doc, &self.exclude_fields)));
                }
                Some(Err(e)) => return Err(classify_feed_error(e.to_string())),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        if page.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page))
        }
    }
}

/// Drop bulky top-level fields the pipeline never mirrors.
///
/// Cosmos SQL has no exclusion projection, so the trim happens here at
/// the adapter boundary.
fn strip_fields(mut doc: Value, exclude: &[String]) -> Value {
    if let Value::Object(map) = &mut doc {
        for field in exclude {
            map.remove(field);
        }
    }
    doc
}

/// Map an SDK feed error into the source taxonomy.
///
/// The SDK surfaces faults as opaque errors, so classification is by
/// message inspection; only connection and timeout kinds are treated
/// as transient.
fn classify_feed_error(message: String) -> StrataError {
    let lowered = message.to_lowercase();

    let source_error = if lowered.contains("timed out") || lowered.contains("timeout") {
        SourceError::ExecutionTimeout(message)
    } else if lowered.contains("connection")
        || lowered.contains("connect")
        || lowered.contains("broken pipe")
        || lowered.contains("reset")
    {
        SourceError::ConnectionFailed(message)
    } else {
        SourceError::QueryFailed(message)
    };

    StrataError::Source(source_error)
}
