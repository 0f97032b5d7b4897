use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::modality::Modality;

#[derive(Debug, Error)]
/// Failures that abort a whole query.
///
/// Per-modality degradation (candidate fetch, reranking, index search)
/// never surfaces here; those fall back inside the orchestrator.
pub enum QueryError {
    /// User identifier rejected at the boundary.
    #[error("invalid user identifier: '{user}'")]
    InvalidUser {
        /// Offending user.
        user: String,
    },

    /// Empty query text rejected at the boundary.
    #[error("query text must not be empty")]
    EmptyQuery,

    /// The query text could not be embedded for a modality's space.
    ///
    /// Without a query vector the modality cannot be searched at all, so
    /// this surfaces as an error rather than a silent empty result.
    #[error("failed to embed query for {modality}: {source}")]
    QueryEmbedding {
        /// Modality whose embedding failed.
        modality: Modality,
        /// Underlying failure.
        source: EmbeddingError,
    },
}
