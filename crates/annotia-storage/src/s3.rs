use crate::traits::{Storage, StorageError, StorageResult};
use annotia_core::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};

/// Split an `s3://bucket/key` URI into bucket and key.
pub(crate) fn parse_s3_uri(uri: &str) -> StorageResult<(&str, &str)> {
    let rest = uri
        .strip_prefix("s3://")
        .ok_or_else(|| StorageError::InvalidPath(format!("Not an s3:// URI: {}", uri)))?;
    let (bucket, key) = rest
        .split_once('/')
        .ok_or_else(|| StorageError::InvalidPath(format!("s3 URI has no key: {}", uri)))?;
    if bucket.is_empty() || key.is_empty() {
        return Err(StorageError::InvalidPath(format!(
            "s3 URI has empty bucket or key: {}",
            uri
        )));
    }
    Ok((bucket, key))
}

/// Build an AmazonS3 object store for a bucket from environment credentials
/// and the optional custom endpoint.
pub(crate) fn build_store(
    bucket: &str,
    region: Option<&str>,
    endpoint_url: Option<&str>,
) -> StorageResult<AmazonS3> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.to_string());

    if let Some(region) = region {
        builder = builder.with_region(region.to_string());
    }

    if let Some(endpoint) = endpoint_url {
        let allow_http = endpoint.starts_with("http://");
        builder = builder
            .with_endpoint(endpoint.to_string())
            .with_allow_http(allow_http);
    }

    builder
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))
}

/// S3 storage implementation
///
/// Addresses files by `s3://bucket/key` URIs for the configured bucket.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    pub async fn new(
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let store = build_store(&bucket, region.as_deref(), endpoint_url.as_deref())?;
        Ok(S3Storage { store, bucket })
    }

    /// Resolve a stored URI to an object key within the configured bucket.
    fn to_key(&self, uri: &str) -> StorageResult<String> {
        let (bucket, key) = parse_s3_uri(uri)?;
        if bucket != self.bucket {
            return Err(StorageError::InvalidPath(format!(
                "URI bucket {} does not match configured bucket {}",
                bucket, self.bucket
            )));
        }
        Ok(key.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let key = self.to_key(path)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 read failed"
                );
                StorageError::ReadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 read successful"
        );

        Ok(bytes.to_vec())
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let key = self.to_key(path)?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 write failed"
            );
            StorageError::WriteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 write successful"
        );

        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let key = self.to_key(path)?;
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let key = self.to_key(path)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            // Absence is not an error; delete is idempotent.
            Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn create_dir_all(&self, _path: &str) -> StorageResult<()> {
        // Object stores have no directories; keys imply their prefixes.
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_s3_uri_splits_bucket_and_key() {
        let (bucket, key) = parse_s3_uri("s3://media/datasets/cats/img1.jpg").unwrap();
        assert_eq!(bucket, "media");
        assert_eq!(key, "datasets/cats/img1.jpg");
    }

    #[test]
    fn parse_s3_uri_rejects_other_schemes_and_bare_buckets() {
        assert!(matches!(
            parse_s3_uri("/datasets/cats/img1.jpg"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            parse_s3_uri("gs://bucket/key"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            parse_s3_uri("s3://bucket-only"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
