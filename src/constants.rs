//! Crate-wide defaults.
//!
//! Dimension defaults match the bundled model lineup; override through
//! [`Config`](crate::config::Config) and the per-capability configs when
//! running different checkpoints.

/// Default output dimension of the text-space embedder.
pub const DEFAULT_TEXT_EMBEDDING_DIM: usize = 768;

/// Default output dimension of the code-space embedder.
pub const DEFAULT_CODE_EMBEDDING_DIM: usize = 768;

/// Output dimension of the CLIP joint text/image space (ViT-B/32 projection).
pub const CLIP_EMBEDDING_DIM: usize = 512;

/// Max tokens fed to the text and code embedders.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// First-stage candidates fetched per final result slot.
///
/// The similarity search is cheap but coarse; the reranker needs headroom
/// to correct its ordering. Useful values sit between 3 and 10.
pub const DEFAULT_OVERFETCH_MULTIPLIER: usize = 5;

/// Per-modality reranking deadline before degrading to similarity order.
pub const DEFAULT_RERANK_TIMEOUT_MS: u64 = 10_000;

/// Timeout for object-store and plot-transcriber HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
