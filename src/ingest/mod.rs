//! Ingestion orchestration.
//!
//! Turns one "fragment stored" notification into one indexed vector, or
//! drops the notification safely. A malformed or unsupported fragment
//! must never block later notifications; only a transiently unavailable
//! index propagates an error so the transport can redeliver. Reprocessing
//! a notification converges on the same stored vector because the index
//! insert is an upsert.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::IngestError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::CapabilityRegistry;
use crate::index::{PartitionId, VectorIndex, partition_of};
use crate::modality::{Modality, classify, user_from_key};
use crate::storage::ObjectStore;

/// A "fragment stored" notification.
///
/// The modality tag is optional: producers that know it send it, others
/// leave classification to the key suffix. Both shapes are supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentStored {
    /// Fragment key (`"<user>/<path>.<ext>"`).
    pub key: String,
    /// Explicit modality tag, overriding suffix classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
}

/// Successful ingestion summary.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    /// Fragment key.
    pub key: String,
    /// Resolved modality.
    pub modality: Modality,
    /// Partition the vector landed in.
    pub partition: PartitionId,
}

/// Terminal state of one notification.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The fragment was embedded and indexed.
    Indexed(IngestReceipt),
    /// The notification was dropped (fragment-specific failure; the
    /// transport must not redeliver it).
    Dropped {
        /// Fragment key.
        key: String,
        /// Human-readable drop reason.
        reason: String,
    },
}

/// Ingestion orchestrator.
///
/// Stateless apart from the shared read-only collaborators, so one
/// instance serves concurrent notifications without locking.
pub struct Ingestor<I> {
    index: Arc<I>,
    store: Arc<dyn ObjectStore>,
    registry: Arc<CapabilityRegistry>,
}

impl<I: VectorIndex> Ingestor<I> {
    /// Creates an ingestor over shared collaborators.
    pub fn new(
        index: Arc<I>,
        store: Arc<dyn ObjectStore>,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            index,
            store,
            registry,
        }
    }

    /// Runs the full pipeline, surfacing every failure.
    ///
    /// 1. Resolve the modality (explicit tag, else key suffix).
    /// 2. Fetch the fragment body.
    /// 3. Embed it with the modality's capability.
    /// 4. Derive the `(user, modality)` partition.
    /// 5. Upsert into the index.
    pub async fn ingest(&self, note: &FragmentStored) -> Result<IngestReceipt, IngestError> {
        let modality = match note.modality {
            Some(m) => m,
            None => classify(&note.key)?,
        };
        let user = user_from_key(&note.key)?;
        let partition = partition_of(user, modality)?;

        let body = self.store.get(&note.key).await?;
        debug!(key = %note.key, %modality, bytes = body.len(), "Fetched fragment");

        let embedder = self.registry.embedder_for(modality)?;
        let vector = embedder.embed(&body).await?;

        self.index.upsert(&partition, &note.key, vector).await?;

        info!(key = %note.key, %modality, partition = %partition, "Indexed fragment");

        Ok(IngestReceipt {
            key: note.key.clone(),
            modality,
            partition,
        })
    }

    /// Drop-and-log wrapper around [`ingest`](Self::ingest).
    ///
    /// Fragment-specific failures resolve to [`IngestOutcome::Dropped`];
    /// only retryable index failures escape as errors, for the transport
    /// to redeliver.
    pub async fn process(&self, note: FragmentStored) -> Result<IngestOutcome, IngestError> {
        match self.ingest(&note).await {
            Ok(receipt) => Ok(IngestOutcome::Indexed(receipt)),
            Err(e) if e.is_retryable() => {
                warn!(key = %note.key, error = %e, "Index unavailable, leaving notification for redelivery");
                Err(e)
            }
            Err(e) => {
                warn!(key = %note.key, error = %e, "Dropping fragment notification");
                Ok(IngestOutcome::Dropped {
                    key: note.key,
                    reason: e.to_string(),
                })
            }
        }
    }
}
