//! GGUF-backed text embedder (text and code spaces).
//!
//! Use [`GgufConfig::stub`] for tests/examples without model files.

pub mod config;
pub(crate) mod model;

#[cfg(test)]
mod tests;

pub use config::GgufConfig;

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{Device, IndexOp, Tensor};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::embedding::capability::EmbeddingCapability;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{load_tokenizer, normalize, stub_embedding};
use crate::hashing::hash_to_u64;

use model::EmbeddingDecoder;

enum GgufBackend {
    Model {
        model: Arc<Mutex<EmbeddingDecoder>>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Embedding generator over a quantized causal transformer with last-token
/// pooling (supports stub mode).
pub struct GgufEmbedder {
    backend: GgufBackend,
    config: GgufConfig,
}

impl std::fmt::Debug for GgufEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GgufEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    GgufBackend::Model { device, .. } => format!("Model({:?})", device),
                    GgufBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl GgufEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: GgufConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("GGUF embedder running in STUB mode (testing only)");
            return Ok(Self {
                backend: GgufBackend::Stub,
                config,
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for GGUF embedder");

        if !config.model_available() || !config.tokenizer_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let (model, tokenizer) = Self::load_model(&config, &device)?;

        info!(
            model_path = %config.model_path.display(),
            embedding_dim = config.embedding_dim,
            max_seq_len = config.max_seq_len,
            hidden_size = model.config().hidden_size,
            num_layers = model.config().num_layers,
            "GGUF embedding model loaded"
        );

        Ok(Self {
            backend: GgufBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    fn load_model(
        config: &GgufConfig,
        device: &Device,
    ) -> Result<(EmbeddingDecoder, tokenizers::Tokenizer), EmbeddingError> {
        let tokenizer = load_tokenizer(&config.tokenizer_path).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        let mut model_file = std::fs::File::open(&config.model_path)?;
        let content = candle_core::quantized::gguf_file::Content::read(&mut model_file).map_err(
            |e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to read GGUF content: {}", e),
            },
        )?;

        let model =
            EmbeddingDecoder::from_gguf(content, &mut model_file, device, config.max_seq_len)
                .map_err(|e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to load decoder: {}", e),
                })?;

        if config.embedding_dim > model.config().hidden_size {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) exceeds model hidden_size ({})",
                    config.embedding_dim,
                    model.config().hidden_size
                ),
            });
        }

        Ok((model, tokenizer))
    }

    /// Embeds one string (after prefixing) into the configured dimension.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            GgufBackend::Model {
                model,
                tokenizer,
                device,
            } => self.embed_with_model(text, model, tokenizer, device),
            GgufBackend::Stub => Ok(stub_embedding(
                hash_to_u64(text.as_bytes()),
                self.config.embedding_dim,
            )),
        }
    }

    fn embed_with_model(
        &self,
        text: &str,
        model: &Arc<Mutex<EmbeddingDecoder>>,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Ok(vec![0.0; self.config.embedding_dim]);
        }

        if tokens.len() > self.config.max_seq_len {
            tokens.truncate(self.config.max_seq_len);
        }

        debug!(
            text_len = text.len(),
            token_count = tokens.len(),
            "Generating embedding (decoder forward pass)"
        );

        let input_ids = Tensor::new(&tokens[..], device)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to create input tensor: {}", e),
            })?
            .unsqueeze(0)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to unsqueeze input: {}", e),
            })?;

        let hidden_states =
            model
                .lock()
                .forward(&input_ids)
                .map_err(|e| EmbeddingError::InferenceFailed {
                    reason: format!("Decoder forward pass failed: {}", e),
                })?;

        // Last-token pooling, truncated to the configured dimension.
        let last_idx = tokens.len() - 1;
        let embedding = hidden_states
            .i((0, last_idx, ..self.config.embedding_dim))
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to extract last token embedding: {}", e),
            })?
            .to_vec1::<f32>()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to convert embedding to vec: {}", e),
            })?;

        Ok(normalize(embedding))
    }

    fn with_prefix(text: &str, prefix: Option<&String>) -> String {
        match prefix {
            Some(p) => format!("{p}{text}"),
            None => text.to_string(),
        }
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, GgufBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &GgufConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingCapability for GgufEmbedder {
    async fn embed(&self, data: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        let text = std::str::from_utf8(data).map_err(|e| EmbeddingError::InvalidText {
            reason: e.to_string(),
        })?;
        let prefixed = Self::with_prefix(text, self.config.document_prefix.as_ref());
        self.embed_text(&prefixed)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let prefixed = Self::with_prefix(text, self.config.query_prefix.as_ref());
        self.embed_text(&prefixed)
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}
