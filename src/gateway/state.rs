use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::embedding::CapabilityRegistry;
use crate::index::VectorIndex;
use crate::ingest::Ingestor;
use crate::retrieval::Retriever;
use crate::storage::ObjectStore;

/// Shared handler state: the two orchestrators plus the index handle for
/// readiness checks.
pub struct AppState<I> {
    pub ingestor: Arc<Ingestor<I>>,
    pub retriever: Arc<Retriever<I>>,
    pub index: Arc<I>,
}

impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            ingestor: Arc::clone(&self.ingestor),
            retriever: Arc::clone(&self.retriever),
            index: Arc::clone(&self.index),
        }
    }
}

impl<I: VectorIndex> AppState<I> {
    /// Wires the orchestrators over shared collaborators.
    pub fn new(
        index: Arc<I>,
        store: Arc<dyn ObjectStore>,
        registry: Arc<CapabilityRegistry>,
        config: &Config,
    ) -> Self {
        let ingestor = Arc::new(Ingestor::new(
            Arc::clone(&index),
            Arc::clone(&store),
            Arc::clone(&registry),
        ));

        let retriever = Arc::new(Retriever::new(
            Arc::clone(&index),
            store,
            registry,
            config.overfetch_multiplier,
            Duration::from_millis(config.rerank_timeout_ms),
        ));

        Self {
            ingestor,
            retriever,
            index,
        }
    }
}
