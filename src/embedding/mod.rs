//! Embedding and reranking capabilities.
//!
//! - [`gguf`] embeds text and code fragments (quantized decoder, last-token pooling).
//! - [`clip`] embeds images/videos and projects text queries into the same space.
//! - [`plot`] transcribes charts into data tables for the text space.
//! - [`reranker`] provides cross-encoder scoring for second-stage ranking.
//! - [`registry`] is the modality dispatch table wiring it all together.

/// BERT cross-encoder wrapper used by the reranker.
pub mod bert;
/// Capability contracts.
pub mod capability;
/// CLIP joint text/image embedder.
pub mod clip;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// GGUF text/code embedder.
pub mod gguf;
/// Plot embedding via transcription.
pub mod plot;
/// Modality dispatch tables.
pub mod registry;
/// Cross-encoder reranker.
pub mod reranker;
/// Tokenizer/model loading helpers.
pub mod utils;

pub use capability::EmbeddingCapability;
pub use clip::{ClipEmbedder, ClipEmbedderConfig};
pub use error::EmbeddingError;
pub use gguf::{GgufConfig, GgufEmbedder};
pub use plot::{HttpPlotTranscriber, PlotEmbedder, PlotTranscriber, StubPlotTranscriber};
pub use registry::CapabilityRegistry;
pub use reranker::{CrossEncoderReranker, RerankCapability, RerankerConfig, RerankerError};
