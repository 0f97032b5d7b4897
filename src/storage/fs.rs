use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::error::StorageError;
use super::ObjectStore;

/// Object store rooted in a local directory; key `"alice/notes.txt"` maps
/// to `<root>/alice/notes.txt`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Rejects keys that would escape the store root.
pub(crate) fn sanitize_key(key: &str) -> Option<PathBuf> {
    if key.is_empty() {
        return None;
    }

    let mut out = PathBuf::new();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => continue,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let rel = sanitize_key(key).ok_or_else(|| StorageError::InvalidKey {
            key: key.to_string(),
        })?;

        let path = self.root.join(rel);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
