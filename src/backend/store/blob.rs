/**
 * Image Upload Collaborators
 *
 * The delivery coordinator never stores image bytes itself. It hands the raw
 * payload a client submitted (usually a base64 data URI) to a `BlobStore`
 * and persists the URL that comes back.
 *
 * - `HttpBlobStore` posts the payload to an upload endpoint and reads the
 *   returned URL (`secure_url`, falling back to `url`).
 * - `InlineBlobStore` keeps the payload as-is. Data URIs are valid image
 *   URLs, so this works for development without an external service.
 */
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{BlobStore, StoreError};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Uploads images to an HTTP endpoint (`BLOB_UPLOAD_URL`)
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
}

impl HttpBlobStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, data: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "file": data }))
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("Network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(StoreError::Upload(format!("Upload rejected: {} - {}", status, body)));
        }

        let parsed = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| StoreError::Upload(format!("Failed to parse upload response: {}", e)))?;

        parsed
            .secure_url
            .or(parsed.url)
            .ok_or_else(|| StoreError::Upload("Upload response did not contain a URL".to_string()))
    }
}

/// Keeps the submitted payload as the image URL
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineBlobStore;

#[async_trait]
impl BlobStore for InlineBlobStore {
    async fn upload(&self, data: &str) -> Result<String, StoreError> {
        if data.trim().is_empty() {
            return Err(StoreError::Upload("empty image payload".to_string()));
        }
        Ok(data.to_string())
    }
}
