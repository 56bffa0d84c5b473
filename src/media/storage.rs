use crate::error::StorageError;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Where downloaded media ends up.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create `dir` and its parents if missing
    async fn ensure(&self, dir: &Path) -> Result<(), StorageError>;

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;
}

pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn ensure(&self, dir: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::new(dir, e))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        tokio::fs::write(path, data)
            .await
            .map_err(|e| StorageError::new(path, e))?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}
