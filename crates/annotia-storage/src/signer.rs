//! Presigned URL signer
//!
//! Signing is only supported for the `s3://` scheme; any other scheme fails
//! with a distinct unsupported-operation error. The S3 client handle is
//! created lazily on first use and shared for the life of the signer, which
//! in practice is the life of the process.

use crate::s3::{build_store, parse_s3_uri};
use crate::traits::{StorageError, StorageResult};
use http::Method;
use object_store::aws::AmazonS3;
use object_store::path::Path;
use object_store::signer::Signer;
use std::time::Duration;
use tokio::sync::OnceCell;

pub struct UrlSigner {
    region: Option<String>,
    endpoint_url: Option<String>,
    /// Lazily initialized (bucket, client). Initialization is idempotent;
    /// a first-use race can at worst construct one extra stateless client.
    client: OnceCell<(String, AmazonS3)>,
}

impl UrlSigner {
    pub fn new(region: Option<String>, endpoint_url: Option<String>) -> Self {
        Self {
            region,
            endpoint_url,
            client: OnceCell::new(),
        }
    }

    /// Generate a presigned GET URL for `uri`, valid for `expires_in`.
    ///
    /// `content_type` is accepted for interface parity with upload signing
    /// but does not affect GET URLs.
    pub async fn sign(
        &self,
        uri: &str,
        expires_in: Duration,
        _content_type: Option<&str>,
    ) -> StorageResult<String> {
        if !uri.starts_with("s3://") {
            return Err(StorageError::Unsupported(format!(
                "URL signing is only supported for s3:// URIs, got {}",
                uri
            )));
        }

        let (bucket, key) = parse_s3_uri(uri)?;

        let (client_bucket, store) = self
            .client
            .get_or_try_init(|| async {
                build_store(bucket, self.region.as_deref(), self.endpoint_url.as_deref())
                    .map(|store| (bucket.to_string(), store))
            })
            .await?;

        if client_bucket != bucket {
            return Err(StorageError::BackendError(format!(
                "Signer client is bound to bucket {}, cannot sign for {}",
                client_bucket, bucket
            )));
        }

        let location = Path::from(key);
        let url = store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_s3_schemes_are_unsupported() {
        let signer = UrlSigner::new(None, None);

        let result = signer
            .sign("/datasets/cats/img1.jpg", Duration::from_secs(60), None)
            .await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));

        let result = signer
            .sign(
                "gs://bucket/datasets/cats/img1.jpg",
                Duration::from_secs(60),
                Some("image/jpeg"),
            )
            .await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
    }
}
