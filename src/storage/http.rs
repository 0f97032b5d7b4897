use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;

use super::error::StorageError;
use super::ObjectStore;
use crate::constants::DEFAULT_HTTP_TIMEOUT_MS;

/// Object store reached over HTTP; key `"alice/notes.txt"` maps to
/// `GET {base_url}/alice/notes.txt`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    base_url: String,
    http: HttpClient,
}

impl HttpObjectStore {
    /// Creates a store for `base_url` (trailing slash optional).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpClient::builder()
                .timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
        }
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }

        let url = format!("{}/{}", self.base_url, key);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }

        if !resp.status().is_success() {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: format!("unexpected status {}", resp.status()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| StorageError::ReadFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}
