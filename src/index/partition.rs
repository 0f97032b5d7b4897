use serde::Serialize;

use super::error::IndexError;
use crate::modality::Modality;

/// Separator between the user and modality segments of a partition name.
///
/// Users containing the separator are rejected rather than escaped, which
/// keeps `partition_of` trivially injective: modality tags are a closed
/// set, none contains the separator, and none is a suffix of another.
pub const PARTITION_SEPARATOR: &str = "__";

/// Opaque identifier of one `(user, modality)` partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PartitionId(String);

impl PartitionId {
    /// Returns the partition name as used by the index service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the partition for `(user, modality)`.
///
/// Deterministic and injective: equal partitions imply equal users and
/// equal modalities. Fails with [`IndexError::InvalidUser`] for users
/// that are empty, contain the separator, or contain path separators.
pub fn partition_of(user: &str, modality: Modality) -> Result<PartitionId, IndexError> {
    if user.is_empty() || user.contains(PARTITION_SEPARATOR) || user.contains('/') {
        return Err(IndexError::InvalidUser {
            user: user.to_string(),
        });
    }

    Ok(PartitionId(format!(
        "{user}{PARTITION_SEPARATOR}{}",
        modality.as_str()
    )))
}
