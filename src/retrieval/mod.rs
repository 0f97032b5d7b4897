//! Retrieval orchestration.
//!
//! For every modality: embed the query into that modality's space,
//! over-fetch candidates from the user's partition, then rerank with the
//! registered cross-encoder or fall back to raw similarity order. Each
//! modality's list is independently ranked best-first; no global order is
//! imposed across modalities.

pub mod error;


pub use error::QueryError;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::embedding::{CapabilityRegistry, RerankCapability, RerankerError};
use crate::index::{PartitionId, VectorIndex, partition_of};
use crate::modality::Modality;
use crate::storage::{ObjectStore, StorageError};

/// Ranked keys per modality.
pub type RankedResults = BTreeMap<Modality, Vec<String>>;

#[derive(Debug, Error)]
enum RerankAttemptError {
    #[error("candidate fetch failed: {0}")]
    Fetch(#[from] StorageError),

    #[error("rerank failed: {0}")]
    Rerank(#[from] RerankerError),
}

/// Retrieval orchestrator.
///
/// Stateless apart from the shared read-only collaborators; per-modality
/// work inside one call runs concurrently.
pub struct Retriever<I> {
    index: Arc<I>,
    store: Arc<dyn ObjectStore>,
    registry: Arc<CapabilityRegistry>,
    overfetch_multiplier: usize,
    rerank_timeout: Duration,
}

impl<I: VectorIndex> Retriever<I> {
    /// Creates a retriever over shared collaborators.
    pub fn new(
        index: Arc<I>,
        store: Arc<dyn ObjectStore>,
        registry: Arc<CapabilityRegistry>,
        overfetch_multiplier: usize,
        rerank_timeout: Duration,
    ) -> Self {
        Self {
            index,
            store,
            registry,
            overfetch_multiplier,
            rerank_timeout,
        }
    }

    /// Answers a text query for `user` with up to `budget` keys per
    /// modality, skipping modalities in `exclude`.
    ///
    /// A `budget` of zero returns empty lists for every modality without
    /// touching any external service.
    pub async fn query(
        &self,
        user: &str,
        text: &str,
        budget: usize,
        exclude: &[Modality],
    ) -> Result<RankedResults, QueryError> {
        if text.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let modalities: Vec<Modality> = self
            .registry
            .modalities()
            .into_iter()
            .filter(|m| !exclude.contains(m))
            .collect();

        // Validate the user before any external call; one bad identifier
        // must not reach the index under a half-formed partition name.
        let mut partitions = Vec::with_capacity(modalities.len());
        for &modality in &modalities {
            let partition =
                partition_of(user, modality).map_err(|_| QueryError::InvalidUser {
                    user: user.to_string(),
                })?;
            partitions.push(partition);
        }

        if budget == 0 {
            return Ok(modalities.into_iter().map(|m| (m, Vec::new())).collect());
        }

        let lookups = modalities
            .iter()
            .zip(partitions)
            .map(|(&modality, partition)| async move {
                (
                    modality,
                    self.query_modality(modality, partition, text, budget).await,
                )
            });

        let mut results = RankedResults::new();
        for (modality, outcome) in join_all(lookups).await {
            results.insert(modality, outcome?);
        }

        Ok(results)
    }

    /// One modality's retrieval: over-fetch, then rerank or truncate.
    async fn query_modality(
        &self,
        modality: Modality,
        partition: PartitionId,
        text: &str,
        budget: usize,
    ) -> Result<Vec<String>, QueryError> {
        let embedder = self
            .registry
            .embedder_for(modality)
            .map_err(|source| QueryError::QueryEmbedding { modality, source })?;

        let query_vector = embedder
            .embed_query(text)
            .await
            .map_err(|source| QueryError::QueryEmbedding { modality, source })?;

        let overfetch = budget.saturating_mul(self.overfetch_multiplier);
        let candidates = match self.index.search(&partition, query_vector, overfetch).await {
            Ok(candidates) => candidates,
            Err(e) => {
                // Terminal for this modality only; the others proceed.
                warn!(%modality, error = %e, "Candidate search failed, returning no results");
                return Ok(Vec::new());
            }
        };

        debug!(%modality, candidates = candidates.len(), budget, "Fetched candidates");

        // Reranking a candidate set smaller than the budget cannot change
        // what is returned; pass it through in similarity order.
        if candidates.len() < budget {
            return Ok(candidates);
        }

        if let Some(reranker) = self.registry.reranker_for(modality) {
            let attempt = tokio::time::timeout(
                self.rerank_timeout,
                self.rerank_candidates(text, &candidates, budget, reranker),
            )
            .await;

            match attempt {
                Ok(Ok(ranked)) => return Ok(ranked),
                Ok(Err(e)) => {
                    warn!(%modality, error = %e, "Reranking degraded to similarity order");
                }
                Err(_) => {
                    warn!(%modality, timeout = ?self.rerank_timeout, "Reranking timed out, degrading to similarity order");
                }
            }
        }

        Ok(candidates.into_iter().take(budget).collect())
    }

    /// Fetches candidate bodies and applies the cross-encoder.
    ///
    /// Any single fetch failure degrades the whole modality to similarity
    /// order rather than reranking a partial candidate set.
    async fn rerank_candidates(
        &self,
        text: &str,
        candidates: &[String],
        budget: usize,
        reranker: Arc<dyn RerankCapability>,
    ) -> Result<Vec<String>, RerankAttemptError> {
        let mut bodies = Vec::with_capacity(candidates.len());
        for key in candidates {
            bodies.push(self.store.get(key).await?);
        }

        let ranks = reranker.rerank(text, &bodies, budget).await?;

        Ok(ranks
            .into_iter()
            .filter_map(|idx| candidates.get(idx).cloned())
            .take(budget)
            .collect())
    }
}
