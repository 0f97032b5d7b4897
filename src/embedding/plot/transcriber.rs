use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::constants::DEFAULT_HTTP_TIMEOUT_MS;
use crate::embedding::error::EmbeddingError;

/// Plot-to-table transcription capability.
///
/// Turns a chart image into the textual data table it depicts, which the
/// text embedder then treats as an ordinary document. The model behind it
/// is an external collaborator; only the contract lives here.
#[async_trait]
pub trait PlotTranscriber: Send + Sync {
    /// Transcribes a plot image into a data table string.
    async fn transcribe(&self, image: &[u8]) -> Result<String, EmbeddingError>;
}

/// Remote transcriber reached over HTTP (`POST {endpoint}` with the raw
/// image body, plain-text table response).
pub struct HttpPlotTranscriber {
    endpoint: String,
    http: HttpClient,
}

impl HttpPlotTranscriber {
    /// Creates a transcriber client for `endpoint`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http: HttpClient::builder()
                .timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
        }
    }

    /// Returns the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PlotTranscriber for HttpPlotTranscriber {
    async fn transcribe(&self, image: &[u8]) -> Result<String, EmbeddingError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| EmbeddingError::TranscriptionFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(EmbeddingError::TranscriptionFailed {
                reason: format!("unexpected status {}", resp.status()),
            });
        }

        resp.text()
            .await
            .map_err(|e| EmbeddingError::TranscriptionFailed {
                reason: e.to_string(),
            })
    }
}

/// Deterministic transcriber for tests: derives a tiny stable table from
/// the image bytes so equal plots transcribe equally.
pub struct StubPlotTranscriber;

#[async_trait]
impl PlotTranscriber for StubPlotTranscriber {
    async fn transcribe(&self, image: &[u8]) -> Result<String, EmbeddingError> {
        if image.is_empty() {
            return Err(EmbeddingError::TranscriptionFailed {
                reason: "empty plot payload".to_string(),
            });
        }

        let digest = crate::hashing::hash_to_u64(image);
        Ok(format!(
            "series | value\nplot-{digest:016x} | {}",
            image.len()
        ))
    }
}
