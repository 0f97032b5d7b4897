//! CLIP joint text/image embedder (image and video partitions).
//!
//! Fragments go through the vision tower; queries against image
//! partitions go through the text tower into the same space. Use
//! [`ClipEmbedderConfig::stub`] for tests without model files.

pub mod config;

#[cfg(test)]
mod tests;

pub use config::{CLIP_IMAGE_SIZE, CLIP_MAX_TEXT_TOKENS, ClipEmbedderConfig};

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use tracing::{debug, info, warn};

use config::{CLIP_MEAN, CLIP_STD};

use crate::embedding::capability::EmbeddingCapability;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{load_tokenizer_with_truncation, normalize, stub_embedding};
use crate::hashing::hash_to_u64;

enum ClipBackend {
    Model {
        model: ClipModel,
        tokenizer: tokenizers::Tokenizer,
        device: Device,
    },
    Stub,
}

/// CLIP embedder with a shared preprocessing pipeline for both towers.
pub struct ClipEmbedder {
    backend: ClipBackend,
    config: ClipEmbedderConfig,
}

impl std::fmt::Debug for ClipEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    ClipBackend::Model { device, .. } => format!("Model({:?})", device),
                    ClipBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .finish()
    }
}

impl ClipEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: ClipEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("CLIP embedder running in STUB mode (testing only)");
            return Ok(Self {
                backend: ClipBackend::Stub,
                config,
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for CLIP");

        let weights_path = config.model_dir.join("model.safetensors");
        if !weights_path.exists() {
            return Err(EmbeddingError::ModelNotFound { path: weights_path });
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device).map_err(
                |e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to map safetensors: {}", e),
                },
            )?
        };

        let clip_config = ClipConfig::vit_base_patch32();
        let model =
            ClipModel::new(vb, &clip_config).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load CLIP model: {}", e),
            })?;

        let tokenizer = load_tokenizer_with_truncation(&config.model_dir, CLIP_MAX_TEXT_TOKENS)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        info!(
            model_dir = %config.model_dir.display(),
            embedding_dim = config.embedding_dim,
            "CLIP model loaded"
        );

        Ok(Self {
            backend: ClipBackend::Model {
                model,
                tokenizer,
                device,
            },
            config,
        })
    }

    /// Decodes, resizes and normalizes an image into a `[1, 3, S, S]` tensor.
    fn preprocess_image(data: &[u8], device: &Device) -> Result<Tensor, EmbeddingError> {
        if data.is_empty() {
            return Err(EmbeddingError::InvalidImage {
                reason: "empty image payload".to_string(),
            });
        }

        let img = image::load_from_memory(data).map_err(|e| EmbeddingError::InvalidImage {
            reason: e.to_string(),
        })?;

        let size = CLIP_IMAGE_SIZE;
        let rgb = img
            .resize_exact(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8();

        // Channel-first layout with per-channel normalization.
        let mut tensor = Vec::with_capacity((size * size * 3) as usize);
        for channel in 0..3 {
            for pixel in rgb.pixels() {
                let value = pixel[channel] as f32 / 255.0;
                tensor.push((value - CLIP_MEAN[channel]) / CLIP_STD[channel]);
            }
        }

        Tensor::from_vec(tensor, (1, 3, size as usize, size as usize), device)
            .map_err(EmbeddingError::from)
    }
}

#[async_trait]
impl EmbeddingCapability for ClipEmbedder {
    async fn embed(&self, data: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            ClipBackend::Model { model, device, .. } => {
                let pixels = Self::preprocess_image(data, device)?;
                let features = model
                    .get_image_features(&pixels)
                    .map_err(|e| EmbeddingError::InferenceFailed {
                        reason: format!("Vision tower failed: {}", e),
                    })?;
                let embedding = features
                    .flatten_all()
                    .map_err(EmbeddingError::from)?
                    .to_vec1::<f32>()
                    .map_err(EmbeddingError::from)?;
                Ok(normalize(embedding))
            }
            ClipBackend::Stub => {
                if data.is_empty() {
                    return Err(EmbeddingError::InvalidImage {
                        reason: "empty image payload".to_string(),
                    });
                }
                Ok(stub_embedding(hash_to_u64(data), self.config.embedding_dim))
            }
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            ClipBackend::Model {
                model,
                tokenizer,
                device,
            } => {
                let encoding = tokenizer.encode(text, true).map_err(|e| {
                    EmbeddingError::TokenizationFailed {
                        reason: e.to_string(),
                    }
                })?;

                let tokens: Vec<u32> = encoding.get_ids().to_vec();
                if tokens.is_empty() {
                    return Err(EmbeddingError::TokenizationFailed {
                        reason: "query tokenized to zero tokens".to_string(),
                    });
                }

                let input_ids = Tensor::new(&tokens[..], device)
                    .map_err(EmbeddingError::from)?
                    .unsqueeze(0)
                    .map_err(EmbeddingError::from)?;

                let features = model.get_text_features(&input_ids).map_err(|e| {
                    EmbeddingError::InferenceFailed {
                        reason: format!("Text tower failed: {}", e),
                    }
                })?;

                let embedding = features
                    .flatten_all()
                    .map_err(EmbeddingError::from)?
                    .to_vec1::<f32>()
                    .map_err(EmbeddingError::from)?;
                Ok(normalize(embedding))
            }
            ClipBackend::Stub => Ok(stub_embedding(
                hash_to_u64(text.as_bytes()),
                self.config.embedding_dim,
            )),
        }
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}
