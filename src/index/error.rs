use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by vector index operations.
pub enum IndexError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Partition creation failed.
    #[error("failed to create partition '{partition}': {message}")]
    PartitionCreateFailed {
        /// Partition name.
        partition: String,
        /// Error message.
        message: String,
    },

    /// Upsert failed.
    #[error("failed to upsert into '{partition}': {message}")]
    UpsertFailed {
        /// Partition name.
        partition: String,
        /// Error message.
        message: String,
    },

    /// Search failed.
    #[error("failed to search '{partition}': {message}")]
    SearchFailed {
        /// Partition name.
        partition: String,
        /// Error message.
        message: String,
    },

    /// Vector length disagrees with the partition's established dimension.
    ///
    /// This is a wiring defect between embedding dispatch and partition
    /// creation, not a transient condition; it must never be retried.
    #[error("dimension mismatch in '{partition}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Partition name.
        partition: String,
        /// Established dimension.
        expected: usize,
        /// Offending vector length.
        actual: usize,
    },

    /// User identifier cannot form a collision-free partition name.
    #[error("invalid user identifier: '{user}'")]
    InvalidUser {
        /// Offending user.
        user: String,
    },
}

impl IndexError {
    /// Returns `true` for transport-level failures worth redelivering.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexError::ConnectionFailed { .. }
                | IndexError::PartitionCreateFailed { .. }
                | IndexError::UpsertFailed { .. }
                | IndexError::SearchFailed { .. }
        )
    }
}
