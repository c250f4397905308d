use crate::traits::{Storage, StorageError, StorageResult};
use annotia_core::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Rooted at the dataset directory; every addressed path must stay inside
/// that root. Paths are the absolute paths stored on the records.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `root`
    /// (e.g. "/datasets").
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStorage { root })
    }

    /// Validate a stored path and convert it to a filesystem path.
    ///
    /// Rejects traversal sequences and any path outside the storage root.
    fn to_fs_path(&self, path: &str) -> StorageResult<PathBuf> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(
                "Storage path contains traversal segments".to_string(),
            ));
        }

        let candidate = PathBuf::from(path);
        if !candidate.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(format!(
                "Storage path resolves outside {}",
                self.root.display()
            )));
        }

        Ok(candidate)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let fs_path = self.to_fs_path(path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&fs_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let data = fs::read(&fs_path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read {}: {}", fs_path.display(), e))
        })?;

        tracing::debug!(
            path = %fs_path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let fs_path = self.to_fs_path(path)?;
        let size = data.len();

        self.ensure_parent_dir(&fs_path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&fs_path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create {}: {}", fs_path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write {}: {}", fs_path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync {}: {}", fs_path.display(), e))
        })?;

        tracing::info!(
            path = %fs_path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let fs_path = self.to_fs_path(path)?;
        Ok(fs::try_exists(&fs_path).await.unwrap_or(false))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let fs_path = self.to_fs_path(path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&fs_path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&fs_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete {}: {}", fs_path.display(), e))
        })?;

        tracing::info!(
            path = %fs_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> StorageResult<()> {
        let fs_path = self.to_fs_path(path)?;
        fs::create_dir_all(&fs_path).await?;
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::new(dir.path()).await.unwrap()
    }

    fn path_in(dir: &tempfile::TempDir, rel: &str) -> String {
        format!("{}/{}", dir.path().display(), rel)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let path = path_in(&dir, "cats/img1.jpg");

        let data = b"jpeg bytes".to_vec();
        storage.write(&path, data.clone()).await.unwrap();

        assert!(storage.exists(&path).await.unwrap());
        assert_eq!(storage.read(&path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let path = path_in(&dir, "missing.jpg");

        let result = storage.read(&path).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let path = path_in(&dir, "gone.jpg");

        storage.write(&path, b"x".to_vec()).await.unwrap();
        storage.delete(&path).await.unwrap();
        // Second delete of an absent file succeeds.
        storage.delete(&path).await.unwrap();
        assert!(!storage.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn paths_outside_root_are_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;

        let result = storage.read("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));

        let traversal = path_in(&dir, "../escape.jpg");
        let result = storage.read(&traversal).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn create_dir_all_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let sub = path_in(&dir, "cats/thumbnail-cache");

        storage.create_dir_all(&sub).await.unwrap();
        storage.create_dir_all(&sub).await.unwrap();
        assert!(std::path::Path::new(&sub).is_dir());
    }
}
