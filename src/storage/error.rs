use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by object-store reads.
pub enum StorageError {
    /// The key does not exist in the store.
    #[error("object not found: {key}")]
    NotFound {
        /// Requested key.
        key: String,
    },

    /// The key is malformed (empty or path-traversing).
    #[error("invalid object key: {key}")]
    InvalidKey {
        /// Requested key.
        key: String,
    },

    /// The store could not be reached or the read failed.
    #[error("failed to read object '{key}': {message}")]
    ReadFailed {
        /// Requested key.
        key: String,
        /// Error message.
        message: String,
    },
}
