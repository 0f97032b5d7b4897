use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::client::VectorIndex;
use super::error::IndexError;
use super::partition::PartitionId;
use crate::hashing::point_id_for_key;

/// In-memory [`VectorIndex`] with cosine scoring for tests.
#[derive(Default)]
pub struct MockVectorIndex {
    partitions: RwLock<HashMap<String, MockPartition>>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct MockPartition {
    dim: usize,
    points: HashMap<u64, MockPoint>,
}

struct MockPoint {
    key: String,
    vector: Vec<f32>,
}

impl MockVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a retryable error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of points stored in `partition`, if it exists.
    pub fn point_count(&self, partition: &PartitionId) -> Option<usize> {
        self.partitions
            .read()
            .ok()?
            .get(partition.as_str())
            .map(|p| p.points.len())
    }

    /// The dimension `partition` was created with, if it exists.
    pub fn partition_dim(&self, partition: &PartitionId) -> Option<usize> {
        self.partitions
            .read()
            .ok()?
            .get(partition.as_str())
            .map(|p| p.dim)
    }
}

impl VectorIndex for MockVectorIndex {
    async fn is_ready(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    async fn upsert(
        &self,
        partition: &PartitionId,
        key: &str,
        vector: Vec<f32>,
    ) -> Result<(), IndexError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::UpsertFailed {
                partition: partition.as_str().to_string(),
                message: "index unavailable (injected)".to_string(),
            });
        }

        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| IndexError::UpsertFailed {
                partition: partition.as_str().to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let slot = partitions
            .entry(partition.as_str().to_string())
            .or_insert_with(|| MockPartition {
                dim: vector.len(),
                points: HashMap::new(),
            });

        if vector.len() != slot.dim {
            return Err(IndexError::DimensionMismatch {
                partition: partition.as_str().to_string(),
                expected: slot.dim,
                actual: vector.len(),
            });
        }

        slot.points.insert(
            point_id_for_key(key),
            MockPoint {
                key: key.to_string(),
                vector,
            },
        );

        Ok(())
    }

    async fn search(
        &self,
        partition: &PartitionId,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<String>, IndexError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::SearchFailed {
                partition: partition.as_str().to_string(),
                message: "index unavailable (injected)".to_string(),
            });
        }

        let partitions = self.partitions.read().map_err(|_| IndexError::SearchFailed {
            partition: partition.as_str().to_string(),
            message: "lock poisoned".to_string(),
        })?;

        // Missing partition means "no candidates", never an error.
        let Some(slot) = partitions.get(partition.as_str()) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &MockPoint)> = slot
            .points
            .values()
            .map(|p| (cosine_similarity(&vector, &p.vector), p))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, p)| p.key.clone()).collect())
    }
}

/// Cosine similarity between two vectors (0.0 on length mismatch).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
