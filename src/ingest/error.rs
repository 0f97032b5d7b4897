use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;
use crate::modality::ModalityError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
/// Failures while turning one notification into one indexed vector.
pub enum IngestError {
    /// Key could not be classified or parsed.
    #[error(transparent)]
    Modality(#[from] ModalityError),

    /// Fragment body could not be fetched.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Embedding failed or no capability is registered.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Index insert failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl IngestError {
    /// Returns `true` when the surrounding transport should redeliver the
    /// notification. Everything else is fragment-specific and dropped
    /// after logging.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Index(e) => e.is_retryable(),
            _ => false,
        }
    }
}
