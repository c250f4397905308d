//! Storage factory
//!
//! Creates the configured storage backend. Backend choice and S3 settings
//! come from the application config.

use crate::traits::{Storage, StorageError, StorageResult};
use annotia_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create a storage backend from the application configuration.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = crate::local::LocalStorage::new(config.dataset_directory.clone()).await?;
            tracing::info!(
                root = %config.dataset_directory,
                "Using local storage backend"
            );
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError(
                    "S3_BUCKET must be set when using the S3 storage backend".to_string(),
                )
            })?;
            let storage = crate::s3::S3Storage::new(
                bucket.clone(),
                config.s3_region.clone(),
                config.s3_endpoint.clone(),
            )
            .await?;
            tracing::info!(bucket = %bucket, "Using S3 storage backend");
            Ok(Arc::new(storage))
        }
        #[allow(unreachable_patterns)]
        backend => Err(StorageError::ConfigError(format!(
            "Storage backend {:?} is not compiled in",
            backend
        ))),
    }
}
