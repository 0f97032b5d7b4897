use std::path::PathBuf;
use thiserror::Error;

use crate::modality::Modality;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("failed to decode image: {reason}")]
    InvalidImage { reason: String },

    #[error("fragment is not valid UTF-8: {reason}")]
    InvalidText { reason: String },

    #[error("plot transcription failed: {reason}")]
    TranscriptionFailed { reason: String },

    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    /// No capability is registered for the modality. A configuration
    /// defect, reported rather than retried.
    #[error("no embedding capability registered for modality {modality}")]
    UnavailableModel { modality: Modality },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
