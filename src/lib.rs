//! Prism library crate (used by the server and integration tests).
//!
//! Multi-modal semantic retrieval over per-user vector partitions:
//! fragments are embedded with modality-specific models and indexed under
//! `(user, modality)` partitions; text queries over-fetch candidates per
//! modality and rerank them with a cross-encoder where one is registered.
//!
//! # Public API Surface
//!
//! - [`Config`], [`ConfigError`], [`StartupMode`] - server configuration
//! - [`Modality`], [`classify`], [`user_from_key`] - key classification
//! - [`CapabilityRegistry`], [`EmbeddingCapability`], [`RerankCapability`] - dispatch
//! - [`QdrantIndex`], [`VectorIndex`], [`partition_of`] - vector index facade
//! - [`ObjectStore`], [`FsObjectStore`], [`HttpObjectStore`] - fragment storage
//! - [`Ingestor`], [`FragmentStored`] - ingestion orchestration
//! - [`Retriever`], [`RankedResults`] - retrieval orchestration
//! - [`gateway`] - Axum HTTP surface
//!
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod index;
pub mod ingest;
pub mod modality;
pub mod retrieval;
pub mod storage;

pub use config::{Config, ConfigError, StartupMode};
pub use embedding::{
    CapabilityRegistry, ClipEmbedder, ClipEmbedderConfig, CrossEncoderReranker,
    EmbeddingCapability, EmbeddingError, GgufConfig, GgufEmbedder, HttpPlotTranscriber,
    PlotEmbedder, PlotTranscriber, RerankCapability, RerankerConfig, RerankerError,
    StubPlotTranscriber,
};
pub use gateway::{AppState, GatewayError, PRISM_STATUS_HEADER, create_router_with_state};
pub use hashing::{hash_to_u64, point_id_for_key};
pub use index::{
    IndexError, PARTITION_SEPARATOR, PartitionId, QdrantIndex, VectorIndex, partition_of,
};
#[cfg(any(test, feature = "mock"))]
pub use index::{MockVectorIndex, cosine_similarity};
pub use ingest::{FragmentStored, IngestError, IngestOutcome, IngestReceipt, Ingestor};
pub use modality::{Modality, ModalityError, classify, user_from_key};
pub use retrieval::{QueryError, RankedResults, Retriever};
#[cfg(any(test, feature = "mock"))]
pub use storage::MockObjectStore;
pub use storage::{FsObjectStore, HttpObjectStore, ObjectStore, StorageError};
