//! Azure Blob Storage client
//!
//! Speaks the Blob service REST API directly over `reqwest`, with
//! Azure AD authentication (client credentials flow) for the storage
//! data plane. Every pipeline object (document mirror, partition
//! change list, the index) goes through the same two verbs.

use crate::adapters::blob::traits::BlobStore;
use crate::config::StorageConfig;
use crate::domain::{Result, StorageError, StrataError};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use std::sync::Arc;

const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
const API_VERSION: &str = "2021-12-02";

enum Auth {
    Aad(Arc<ClientSecretCredential>),
    /// Pre-issued bearer token, for tests against a local server.
    #[allow(dead_code)]
    Static(String),
}

/// Blob container client for strata
pub struct AzureBlobStore {
    endpoint: String,
    container: String,
    auth: Auth,
    http_client: reqwest::Client,
}

impl AzureBlobStore {
    /// Create a client from storage configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the AD credential or HTTP client cannot be
    /// constructed.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        use secrecy::ExposeSecret;

        let secret =
            azure_core::credentials::Secret::new(config.client_secret.expose_secret().to_string());

        let credential = ClientSecretCredential::new(
            &config.tenant_id,
            config.client_id.clone(),
            secret,
            None,
        )
        .map_err(|e| {
            StrataError::Storage(StorageError::AuthenticationFailed(format!(
                "Failed to create Azure AD credential: {e}"
            )))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                StrataError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            container: config.container.clone(),
            auth: Auth::Aad(credential),
            http_client,
        })
    }

    /// Test-only constructor bypassing Azure AD.
    #[cfg(test)]
    fn with_static_token(endpoint: &str, container: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            container: container.to_string(),
            auth: Auth::Static(token.to_string()),
            http_client: reqwest::Client::new(),
        }
    }

    /// Get a bearer token for the storage data plane.
    async fn access_token(&self) -> Result<String> {
        match &self.auth {
            Auth::Static(token) => Ok(token.clone()),
            Auth::Aad(credential) => {
                let token = TokenCredential::get_token(&**credential, &[STORAGE_SCOPE], None)
                    .await
                    .map_err(|e| {
                        StrataError::Storage(StorageError::AuthenticationFailed(format!(
                            "Failed to acquire Azure AD token: {e}"
                        )))
                    })?;
                Ok(token.token.secret().to_string())
            }
        }
    }

    fn blob_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.container, key)
    }

    fn classify_send_error(e: reqwest::Error, key: &str) -> StrataError {
        if e.is_timeout() {
            StrataError::Storage(StorageError::Timeout(format!("{key}: {e}")))
        } else {
            StrataError::Storage(StorageError::ConnectionFailed(format!("{key}: {e}")))
        }
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(self.blob_url(key))
            .header("Authorization", format!("Bearer {token}"))
            .header("x-ms-version", API_VERSION)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(e, key))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(StrataError::Storage(StorageError::Throttled(format!(
                "GET {key}: {status}"
            ))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StrataError::Storage(StorageError::DownloadFailed {
                name: key.to_string(),
                message: format!("status {status}: {body}"),
            }));
        }

        let bytes = response.bytes().await.map_err(|e| {
            StrataError::Storage(StorageError::DownloadFailed {
                name: key.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .put(self.blob_url(key))
            .header("Authorization", format!("Bearer {token}"))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(e, key))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(StrataError::Storage(StorageError::Throttled(format!(
                "PUT {key}: {status}"
            ))));
        }
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StrataError::Storage(StorageError::AuthenticationFailed(
                format!("PUT {key}: {status}"),
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StrataError::Storage(StorageError::UploadFailed {
                name: key.to_string(),
                message: format!("status {status}: {text}"),
            }));
        }

        tracing::debug!(blob = key, "Uploaded blob");
        Ok(())
    }
}
