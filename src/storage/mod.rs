//! Object storage access.
//!
//! Fragments live in an external object store addressed by key. The core
//! only ever reads them, one fragment per ingestion or rerank-fetch call,
//! and never retains the bytes.

pub mod error;
/// Filesystem-backed store.
pub mod fs;
/// HTTP-backed store.
pub mod http;
#[cfg(any(test, feature = "mock"))]
/// In-memory store for tests (enabled with `mock` feature).
pub mod mock;


pub use error::StorageError;
pub use fs::FsObjectStore;
pub use http::HttpObjectStore;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockObjectStore;

use async_trait::async_trait;

/// Read access to the external object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches the fragment body for `key`.
    ///
    /// Fails with [`StorageError::NotFound`] when the key does not exist;
    /// callers decide whether that drops a notification or degrades a
    /// rerank pass.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}
