//! Modality-to-capability dispatch tables.
//!
//! A plain table from modality tag to capability instance, populated at
//! process start from [`Config`] and read-only afterwards. Lazy startup
//! defers each model load to first use behind a per-slot mutex; eager
//! startup forces every slot during construction so requests never pay
//! the cold start.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::{Config, StartupMode};
use crate::constants::DEFAULT_CODE_EMBEDDING_DIM;
use crate::modality::{Modality, classifiable_modalities};

use super::capability::EmbeddingCapability;
use super::clip::{ClipEmbedder, ClipEmbedderConfig};
use super::error::EmbeddingError;
use super::gguf::{GgufConfig, GgufEmbedder};
use super::plot::{HttpPlotTranscriber, PlotEmbedder, PlotTranscriber, StubPlotTranscriber};
use super::reranker::{CrossEncoderReranker, RerankCapability, RerankerConfig};

type EmbedderBuild = Box<dyn Fn() -> Result<Arc<dyn EmbeddingCapability>, EmbeddingError> + Send + Sync>;
type RerankerBuild = Box<dyn Fn() -> Result<Arc<dyn RerankCapability>, EmbeddingError> + Send + Sync>;

struct EmbedderSlot {
    cell: Mutex<Option<Arc<dyn EmbeddingCapability>>>,
    build: EmbedderBuild,
}

impl EmbedderSlot {
    fn deferred(build: EmbedderBuild) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(None),
            build,
        })
    }

    fn ready(capability: Arc<dyn EmbeddingCapability>) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(Some(capability)),
            build: Box::new(|| {
                Err(EmbeddingError::InvalidConfig {
                    reason: "slot registered without a builder".to_string(),
                })
            }),
        })
    }

    fn get(&self) -> Result<Arc<dyn EmbeddingCapability>, EmbeddingError> {
        let mut cell = self.cell.lock();
        if let Some(capability) = cell.as_ref() {
            return Ok(Arc::clone(capability));
        }

        let capability = (self.build)()?;
        *cell = Some(Arc::clone(&capability));
        Ok(capability)
    }
}

struct RerankerSlot {
    cell: Mutex<Option<Arc<dyn RerankCapability>>>,
    build: RerankerBuild,
}

impl RerankerSlot {
    fn deferred(build: RerankerBuild) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(None),
            build,
        })
    }

    fn ready(capability: Arc<dyn RerankCapability>) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(Some(capability)),
            build: Box::new(|| {
                Err(EmbeddingError::InvalidConfig {
                    reason: "slot registered without a builder".to_string(),
                })
            }),
        })
    }

    fn get(&self) -> Result<Arc<dyn RerankCapability>, EmbeddingError> {
        let mut cell = self.cell.lock();
        if let Some(capability) = cell.as_ref() {
            return Ok(Arc::clone(capability));
        }

        let capability = (self.build)()?;
        *cell = Some(Arc::clone(&capability));
        Ok(capability)
    }
}

/// Lazily constructed, shared text-space embedder.
///
/// The TEXT capability and the PLOT composite both hold this handle, so
/// exactly one copy of the text model exists regardless of which modality
/// touches it first.
struct SharedTextEmbedder {
    cell: Mutex<Option<Arc<GgufEmbedder>>>,
    config: GgufConfig,
}

impl SharedTextEmbedder {
    fn new(config: GgufConfig) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(None),
            config,
        })
    }

    fn get(&self) -> Result<Arc<GgufEmbedder>, EmbeddingError> {
        let mut cell = self.cell.lock();
        if let Some(embedder) = cell.as_ref() {
            return Ok(Arc::clone(embedder));
        }

        let embedder = Arc::new(GgufEmbedder::load(self.config.clone())?);
        *cell = Some(Arc::clone(&embedder));
        Ok(embedder)
    }
}

/// Closed dispatch table from modality to embedding/reranking capability.
pub struct CapabilityRegistry {
    embedders: BTreeMap<Modality, Arc<EmbedderSlot>>,
    rerankers: BTreeMap<Modality, Arc<RerankerSlot>>,
}

impl CapabilityRegistry {
    /// Builds the dispatch tables from configuration.
    ///
    /// With [`StartupMode::Eager`] every capability is constructed before
    /// this returns, and any load failure surfaces here instead of at
    /// request time.
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingError> {
        let text_config = match &config.text_model_path {
            Some(path) => GgufConfig::new(path.clone()),
            None => {
                warn!("No PRISM_TEXT_MODEL_PATH configured, text embedder runs in stub mode");
                GgufConfig::stub()
            }
        };
        let shared_text = SharedTextEmbedder::new(text_config);

        let code_config = match &config.code_model_path {
            Some(path) => {
                GgufConfig::new(path.clone()).embedding_dim(DEFAULT_CODE_EMBEDDING_DIM)
            }
            None => {
                warn!("No PRISM_CODE_MODEL_PATH configured, code embedder runs in stub mode");
                GgufConfig::stub().embedding_dim(DEFAULT_CODE_EMBEDDING_DIM)
            }
        };

        let clip_config = match &config.clip_model_path {
            Some(path) => ClipEmbedderConfig::new(path.clone()),
            None => {
                warn!("No PRISM_CLIP_MODEL_PATH configured, CLIP embedder runs in stub mode");
                ClipEmbedderConfig::stub()
            }
        };

        let transcriber: Arc<dyn PlotTranscriber> = match &config.plot_transcriber_url {
            Some(url) => Arc::new(HttpPlotTranscriber::new(url)),
            None => {
                warn!("No PRISM_PLOT_TRANSCRIBER_URL configured, plot transcriber runs in stub mode");
                Arc::new(StubPlotTranscriber)
            }
        };

        let reranker_config = match &config.reranker_path {
            Some(path) => RerankerConfig::new(path.clone()),
            None => RerankerConfig::stub(),
        };

        let mut embedders = BTreeMap::new();

        let text_handle = Arc::clone(&shared_text);
        embedders.insert(
            Modality::Text,
            EmbedderSlot::deferred(Box::new(move || {
                Ok(text_handle.get()? as Arc<dyn EmbeddingCapability>)
            })),
        );

        let plot_text = Arc::clone(&shared_text);
        embedders.insert(
            Modality::Plot,
            EmbedderSlot::deferred(Box::new(move || {
                Ok(Arc::new(PlotEmbedder::new(
                    Arc::clone(&transcriber),
                    plot_text.get()?,
                )) as Arc<dyn EmbeddingCapability>)
            })),
        );

        embedders.insert(
            Modality::Code,
            EmbedderSlot::deferred(Box::new(move || {
                Ok(Arc::new(GgufEmbedder::load(code_config.clone())?)
                    as Arc<dyn EmbeddingCapability>)
            })),
        );

        // Video aliases the image capability: same slot, same instance.
        let clip_slot = EmbedderSlot::deferred(Box::new(move || {
            Ok(Arc::new(ClipEmbedder::load(clip_config.clone())?) as Arc<dyn EmbeddingCapability>)
        }));
        embedders.insert(Modality::Image, Arc::clone(&clip_slot));
        embedders.insert(Modality::Video, clip_slot);

        let mut rerankers = BTreeMap::new();
        rerankers.insert(
            Modality::Text,
            RerankerSlot::deferred(Box::new(move || {
                let reranker = CrossEncoderReranker::load(reranker_config.clone()).map_err(|e| {
                    EmbeddingError::ModelLoadFailed {
                        reason: e.to_string(),
                    }
                })?;
                Ok(Arc::new(reranker) as Arc<dyn RerankCapability>)
            })),
        );

        let registry = Self {
            embedders,
            rerankers,
        };

        if config.startup_mode == StartupMode::Eager {
            registry.warm_up()?;
        }

        Ok(registry)
    }

    /// Registers (or replaces) an embedding capability for a modality.
    pub fn register_embedder(
        &mut self,
        modality: Modality,
        capability: Arc<dyn EmbeddingCapability>,
    ) {
        self.embedders
            .insert(modality, EmbedderSlot::ready(capability));
    }

    /// Registers (or replaces) a reranking capability for a modality.
    pub fn register_reranker(&mut self, modality: Modality, capability: Arc<dyn RerankCapability>) {
        self.rerankers
            .insert(modality, RerankerSlot::ready(capability));
    }

    /// Removes a reranker registration (the modality degrades to
    /// similarity order).
    pub fn unregister_reranker(&mut self, modality: Modality) {
        self.rerankers.remove(&modality);
    }

    /// Looks up the embedding capability for `modality`.
    ///
    /// Fails with [`EmbeddingError::UnavailableModel`] when no capability
    /// is registered; that is a configuration defect to report, not a
    /// transient condition to retry.
    pub fn embedder_for(
        &self,
        modality: Modality,
    ) -> Result<Arc<dyn EmbeddingCapability>, EmbeddingError> {
        let slot = self
            .embedders
            .get(&modality)
            .ok_or(EmbeddingError::UnavailableModel { modality })?;
        slot.get()
    }

    /// Looks up the reranking capability for `modality`, if one is
    /// registered. A lazy build failure degrades to `None` with a warning
    /// so the caller falls back to similarity order.
    pub fn reranker_for(&self, modality: Modality) -> Option<Arc<dyn RerankCapability>> {
        let slot = self.rerankers.get(&modality)?;
        match slot.get() {
            Ok(capability) => Some(capability),
            Err(e) => {
                warn!(%modality, error = %e, "Reranker unavailable, degrading to similarity order");
                None
            }
        }
    }

    /// Modalities with a registered embedding capability, in canonical order.
    pub fn modalities(&self) -> Vec<Modality> {
        self.embedders.keys().copied().collect()
    }

    /// Startup consistency check: every modality the classifier can
    /// produce must have a dispatch entry, or ingestion for it would be
    /// unreachable by construction.
    pub fn verify_classifier_coverage(&self) -> Result<(), EmbeddingError> {
        for modality in classifiable_modalities() {
            if !self.embedders.contains_key(&modality) {
                return Err(EmbeddingError::UnavailableModel { modality });
            }
        }
        Ok(())
    }

    /// Forces construction of every registered capability.
    pub fn warm_up(&self) -> Result<(), EmbeddingError> {
        for slot in self.embedders.values() {
            slot.get()?;
        }
        for slot in self.rerankers.values() {
            slot.get()?;
        }
        Ok(())
    }

    /// All-stub registry for tests.
    #[cfg(any(test, feature = "mock"))]
    pub fn stubbed() -> Self {
        Self::from_config(&Config::default()).expect("stub registry always loads")
    }
}
