use std::collections::HashMap;

use parking_lot::RwLock;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::IndexError;
use super::partition::PartitionId;
use crate::hashing::point_id_for_key;

/// Minimal async interface used by the orchestrators.
///
/// `search` never fails on a missing partition: a partition that has not
/// seen its first insert simply has no candidates.
pub trait VectorIndex: Send + Sync {
    /// Returns `true` if the index service is reachable.
    fn is_ready(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Idempotent upsert of `key`'s vector into `partition`, creating the
    /// partition with `vector.len()` dimensions on first use.
    fn upsert(
        &self,
        partition: &PartitionId,
        key: &str,
        vector: Vec<f32>,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    /// Returns up to `limit` keys ordered by descending similarity.
    fn search(
        &self,
        partition: &PartitionId,
        vector: Vec<f32>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, IndexError>> + Send;
}

/// Qdrant-backed implementation of [`VectorIndex`].
///
/// Tracks the dimensionality of every partition it has touched so that a
/// wiring defect between embedding dispatch and partition creation fails
/// loudly instead of reaching the server.
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
    dims: RwLock<HashMap<String, usize>>,
}

impl QdrantIndex {
    /// Creates a client for `url`.
    pub async fn connect(url: &str) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            dims: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create-or-get the partition's collection with dimension `dim`.
    ///
    /// Concurrent creators racing on the same partition must not both
    /// fail: losing the creation race is treated as success as long as
    /// the collection exists afterwards.
    async fn ensure_partition(&self, partition: &PartitionId, dim: usize) -> Result<(), IndexError> {
        let name = partition.as_str();

        if let Some(&known) = self.dims.read().get(name) {
            if known != dim {
                return Err(IndexError::DimensionMismatch {
                    partition: name.to_string(),
                    expected: known,
                    actual: dim,
                });
            }
            return Ok(());
        }

        let exists = self.client.collection_exists(name).await.map_err(|e| {
            IndexError::PartitionCreateFailed {
                partition: name.to_string(),
                message: e.to_string(),
            }
        })?;

        if !exists {
            let create = self
                .client
                .create_collection(
                    CreateCollectionBuilder::new(name)
                        .vectors_config(VectorParamsBuilder::new(dim as u64, Distance::Cosine))
                        .on_disk_payload(true),
                )
                .await;

            match create {
                Ok(_) => {
                    info!(partition = name, dim, "Created partition");
                }
                Err(e) => {
                    let exists_now = self.client.collection_exists(name).await.unwrap_or(false);
                    if !exists_now {
                        return Err(IndexError::PartitionCreateFailed {
                            partition: name.to_string(),
                            message: e.to_string(),
                        });
                    }
                    debug!(partition = name, "Lost partition creation race");
                }
            }
        }

        self.dims.write().insert(name.to_string(), dim);
        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
    async fn is_ready(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    async fn upsert(
        &self,
        partition: &PartitionId,
        key: &str,
        vector: Vec<f32>,
    ) -> Result<(), IndexError> {
        self.ensure_partition(partition, vector.len()).await?;

        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("key".to_string(), key.to_string().into());
        payload.insert(
            "indexed_at".to_string(),
            chrono::Utc::now().timestamp().into(),
        );

        let point = PointStruct::new(point_id_for_key(key), vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(partition.as_str(), vec![point]).wait(true))
            .await
            .map_err(|e| IndexError::UpsertFailed {
                partition: partition.as_str().to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn search(
        &self,
        partition: &PartitionId,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<String>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let name = partition.as_str();

        // A partition that has never seen an insert has no candidates.
        let exists =
            self.client
                .collection_exists(name)
                .await
                .map_err(|e| IndexError::SearchFailed {
                    partition: name.to_string(),
                    message: e.to_string(),
                })?;
        if !exists {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(name, vector, limit as u64).with_payload(true),
            )
            .await
            .map_err(|e| IndexError::SearchFailed {
                partition: name.to_string(),
                message: e.to_string(),
            })?;

        let keys = response
            .result
            .into_iter()
            .filter_map(|point| {
                point
                    .payload
                    .get("key")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
            .collect();

        Ok(keys)
    }
}
