//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. Operations are addressed by the record's stored path: an
//! absolute filesystem path for the local backend, an `s3://bucket/key`
//! URI for the S3 backend.

use annotia_core::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for annotia_core::AppError {
    fn from(err: StorageError) -> Self {
        use annotia_core::AppError;
        match err {
            StorageError::NotFound(path) => AppError::NotFound(path),
            StorageError::Unsupported(msg) => AppError::Unsupported(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3) implement this trait so the
/// image lifecycle can read originals and maintain the thumbnail cache
/// without coupling to a backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a file's full contents.
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write a file, replacing any existing contents. An interrupted write
    /// may leave a torn file; callers rely on overwrite-safe regeneration.
    async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Check whether a file exists.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Delete a file. Absence is not an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Ensure a directory exists, creating it as needed. Object stores
    /// have no directories, so this may be a no-op.
    async fn create_dir_all(&self, path: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
