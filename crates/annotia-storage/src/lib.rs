//! Annotia Storage Library
//!
//! This crate provides the storage abstraction and implementations for
//! Annotia. Records address their files by full path: an absolute
//! filesystem path for the local backend, or an `s3://bucket/key` URI for
//! the S3 backend. It also houses the thumbnail cache path resolver and the
//! presigned URL signer.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "storage-s3")]
pub mod signer;
pub mod thumbnail;
pub mod traits;

// Re-export commonly used types
pub use annotia_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
#[cfg(feature = "storage-s3")]
pub use signer::UrlSigner;
pub use thumbnail::{thumbnail_cache_path, ThumbnailLocator, ThumbnailSize};
pub use traits::{Storage, StorageError, StorageResult};
