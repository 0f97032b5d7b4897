//! Cross-encoder reranking for text candidates.
//!
//! Registered per modality where second-stage scoring pays off; absence
//! of a registration is a valid configuration, not an error.

pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::{MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;

use async_trait::async_trait;
use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::bert::CrossEncoderModel;
use crate::embedding::device::select_device;
use crate::embedding::utils::load_tokenizer_with_truncation;

/// Second-stage scorer reordering a candidate set with a query-aware
/// comparison.
#[async_trait]
pub trait RerankCapability: Send + Sync {
    /// Returns indices into `candidates`, best first, at most `top_k`.
    async fn rerank(
        &self,
        query: &str,
        candidates: &[Vec<u8>],
        top_k: usize,
    ) -> Result<Vec<usize>, RerankerError>;
}

/// BERT cross-encoder reranker (supports stub mode).
pub struct CrossEncoderReranker {
    device: candle_core::Device,
    config: RerankerConfig,
    model: Option<CrossEncoderModel>,
    tokenizer: Option<Tokenizer>,
}

impl std::fmt::Debug for CrossEncoderReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoderReranker")
            .field("device", &format!("{:?}", self.device))
            .field("model_loaded", &self.model.is_some())
            .finish()
    }
}

impl CrossEncoderReranker {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for reranker");

        let Some(ref model_path) = config.model_path else {
            info!("No reranker model path configured, operating in stub mode");
            return Ok(Self {
                device,
                config,
                model: None,
                tokenizer: None,
            });
        };

        if !model_path.exists() {
            return Err(RerankerError::ModelNotFound {
                path: model_path.clone(),
            });
        }

        for required in ["config.json", "model.safetensors"] {
            if !model_path.join(required).exists() {
                return Err(RerankerError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", required, model_path.display()),
                });
            }
        }

        info!(model_path = %model_path.display(), "Loading reranker model");

        let model = CrossEncoderModel::load(model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;

        let tokenizer = load_tokenizer_with_truncation(model_path, MAX_SEQ_LEN).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!("Reranker model loaded");

        Ok(Self {
            device,
            config,
            model: Some(model),
            tokenizer: Some(tokenizer),
        })
    }

    pub fn stub() -> Result<Self, RerankerError> {
        Self::load(RerankerConfig::stub())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    /// Scores one (query, candidate) pair; higher is more relevant.
    pub fn score(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        if let (Some(model), Some(tokenizer)) = (&self.model, &self.tokenizer) {
            let tokens = tokenizer.encode((query, candidate), true).map_err(|e| {
                RerankerError::TokenizationFailed {
                    reason: e.to_string(),
                }
            })?;

            let token_ids = Tensor::new(tokens.get_ids(), &self.device)
                .map_err(RerankerError::from)?
                .unsqueeze(0)
                .map_err(RerankerError::from)?;

            let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)
                .map_err(RerankerError::from)?
                .unsqueeze(0)
                .map_err(RerankerError::from)?;

            let attention_mask = Tensor::new(tokens.get_attention_mask(), &self.device)
                .map_err(RerankerError::from)?
                .unsqueeze(0)
                .map_err(RerankerError::from)?;

            let logits = model
                .forward(&token_ids, &type_ids, Some(&attention_mask))
                .map_err(|e| RerankerError::InferenceFailed {
                    reason: e.to_string(),
                })?;

            let score = logits
                .flatten_all()
                .map_err(RerankerError::from)?
                .to_vec1::<f32>()
                .map_err(RerankerError::from)?[0];
            return Ok(score);
        }

        Ok(lexical_overlap_score(query, candidate))
    }
}

#[async_trait]
impl RerankCapability for CrossEncoderReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[Vec<u8>],
        top_k: usize,
    ) -> Result<Vec<usize>, RerankerError> {
        debug!(
            query_len = query.len(),
            num_candidates = candidates.len(),
            top_k,
            "Reranking candidates"
        );

        let mut scored = Vec::with_capacity(candidates.len());
        for (idx, candidate) in candidates.iter().enumerate() {
            let text =
                std::str::from_utf8(candidate).map_err(|e| RerankerError::InvalidCandidate {
                    reason: e.to_string(),
                })?;
            scored.push((idx, self.score(query, text)?));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        debug!(
            top_score = scored.first().map(|(_, s)| *s),
            "Reranking complete"
        );

        Ok(scored.into_iter().map(|(idx, _)| idx).collect())
    }
}

/// Stub scoring: word overlap between query and candidate.
///
/// Good enough to make ordering observable in tests; not a relevance
/// model.
fn lexical_overlap_score(query: &str, candidate: &str) -> f32 {
    use std::collections::HashSet;

    let query_lower = query.to_lowercase();
    let query_words: HashSet<&str> = query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let candidate_lower = candidate.to_lowercase();
    let candidate_words: HashSet<&str> = candidate_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if query_words.is_empty() || candidate_words.is_empty() {
        return 0.0;
    }

    let matches = query_words.intersection(&candidate_words).count() as f32;
    let recall = matches / query_words.len() as f32;
    let jaccard = matches / query_words.union(&candidate_words).count() as f32;

    0.6 * recall + 0.4 * jaccard
}
