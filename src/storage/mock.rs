use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::error::StorageError;
use super::ObjectStore;

/// In-memory object store for tests.
///
/// `fail_key` marks keys whose reads should fail with a transport-style
/// error, for exercising rerank degradation paths.
#[derive(Default, Clone)]
pub struct MockObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `key`.
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data.to_vec());
    }

    /// Makes subsequent reads of `key` fail with [`StorageError::ReadFailed`].
    pub fn fail_key(&self, key: &str) {
        self.failing
            .write()
            .expect("lock poisoned")
            .insert(key.to_string());
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.failing.read().expect("lock poisoned").contains(key) {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: "injected read failure".to_string(),
            });
        }

        self.objects
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }
}
