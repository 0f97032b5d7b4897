//! Vector index facade over Qdrant.
//!
//! One Qdrant collection per `(user, modality)` pair, created lazily on
//! first insert with the dimensionality of the inserted vector. The
//! partition name is the only isolation mechanism between tenants, so its
//! construction lives in [`partition`] and is covered by property tests.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod partition;

#[cfg(test)]
mod tests;

pub use client::{QdrantIndex, VectorIndex};
pub use error::IndexError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockVectorIndex, cosine_similarity};
pub use partition::{PARTITION_SEPARATOR, PartitionId, partition_of};
