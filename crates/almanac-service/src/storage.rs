//! Object storage for uploaded files.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{ServiceError, ServiceResult};

/// Upload/download-by-key contract for document bytes.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Reads the object stored under `key`.
    async fn download(&self, key: &str) -> ServiceResult<Vec<u8>>;

    /// Stores `bytes` under `key` and returns the key it was stored under.
    async fn upload(&self, key: &str, bytes: &[u8]) -> ServiceResult<String>;

    /// Removes the object stored under `key`. Removing a missing object is not an error.
    async fn remove(&self, key: &str) -> ServiceResult<()>;
}

/// Stores objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// ## Summary
    /// Resolves a storage key to a path below the root.
    ///
    /// ## Errors
    /// Returns `InvalidInput` for empty keys and keys that would escape the root.
    fn path_for(&self, key: &str) -> ServiceResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(ServiceError::InvalidInput(format!("invalid storage key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

fn storage_error(key: &str, err: &std::io::Error) -> ServiceError {
    if err.kind() == ErrorKind::NotFound {
        ServiceError::NotFound(format!("storage object {key}"))
    } else {
        ServiceError::StorageError(format!("{key}: {err}"))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    #[tracing::instrument(skip(self))]
    async fn download(&self, key: &str) -> ServiceResult<Vec<u8>> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| storage_error(key, &e))
    }

    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, key: &str, bytes: &[u8]) -> ServiceResult<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(key, &e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| storage_error(key, &e))?;
        Ok(key.to_string())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, key: &str) -> ServiceResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key, "Storage object already absent");
                Ok(())
            }
            Err(e) => Err(storage_error(key, &e)),
        }
    }
}
