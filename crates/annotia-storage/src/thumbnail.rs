//! Thumbnail cache locations
//!
//! Each (image, size) pair maps deterministically to a cache file beside the
//! original: a `thumbnail-cache` directory is inserted before the file name
//! and the requested dimensions are encoded into the name. Works for plain
//! filesystem paths and for remote URIs; the scheme and host of the input
//! are preserved.

use crate::traits::{Storage, StorageResult};
use std::sync::Arc;

/// Directory holding cached thumbnails, created beside the original file.
pub const THUMBNAIL_DIRECTORY: &str = "thumbnail-cache";

/// Maximum thumbnail envelope used when no size is requested.
pub const MAX_THUMBNAIL_SIZE: ThumbnailSize = ThumbnailSize {
    width: 1024,
    height: 1024,
};

/// Requested thumbnail envelope. Explicit fields rather than a bare tuple so
/// width and height cannot be silently swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        MAX_THUMBNAIL_SIZE
    }
}

/// Split a URI into its `scheme://host` prefix and path part. Plain paths
/// have an empty prefix.
fn split_uri(input: &str) -> (&str, &str) {
    if let Some(scheme_end) = input.find("://") {
        let after_scheme = scheme_end + 3;
        match input[after_scheme..].find('/') {
            Some(path_start) => input.split_at(after_scheme + path_start),
            None => (input, ""),
        }
    } else {
        ("", input)
    }
}

/// Split a file name into stem and extension (extension keeps its dot).
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Compute the cache path for `original` at `size`. Pure path arithmetic:
/// deterministic, no filesystem access.
pub fn thumbnail_cache_path(original: &str, size: ThumbnailSize) -> String {
    let (prefix, path) = split_uri(original);

    let mut segments: Vec<&str> = path.split('/').collect();
    let file_name = segments.pop().unwrap_or("");
    let (stem, ext) = split_extension(file_name);
    let cache_name = format!("{}.{}x{}{}", stem, size.width, size.height, ext);

    segments.push(THUMBNAIL_DIRECTORY);
    segments.push(&cache_name);

    format!("{}{}", prefix, segments.join("/"))
}

/// Parent directory of a path/URI, preserving the scheme/host prefix.
pub fn parent_directory(path: &str) -> Option<String> {
    let (prefix, p) = split_uri(path);
    p.rfind('/')
        .map(|idx| format!("{}{}", prefix, &p[..idx]))
        .filter(|parent| !parent.is_empty())
}

/// Resolves cache locations and guarantees the cache directory exists.
#[derive(Clone)]
pub struct ThumbnailLocator {
    storage: Arc<dyn Storage>,
}

impl ThumbnailLocator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Compute the cache path for `(original, size)` and ensure its parent
    /// directory exists. Idempotent; never inspects the original file.
    pub async fn resolve(&self, original: &str, size: ThumbnailSize) -> StorageResult<String> {
        let cache_path = thumbnail_cache_path(original, size);

        if let Some(parent) = parent_directory(&cache_path) {
            self.storage.create_dir_all(&parent).await?;
        }

        Ok(cache_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_resolves_beside_original() {
        let cache = thumbnail_cache_path("/datasets/cats/img1.jpg", ThumbnailSize::new(512, 512));
        assert_eq!(cache, "/datasets/cats/thumbnail-cache/img1.512x512.jpg");
    }

    #[test]
    fn remote_uri_keeps_scheme_and_host() {
        let cache = thumbnail_cache_path(
            "s3://media/datasets/cats/img1.jpg",
            ThumbnailSize::new(512, 512),
        );
        assert_eq!(
            cache,
            "s3://media/datasets/cats/thumbnail-cache/img1.512x512.jpg"
        );
    }

    #[test]
    fn default_size_is_the_max_envelope() {
        let cache = thumbnail_cache_path("/datasets/cats/img1.jpg", ThumbnailSize::default());
        assert_eq!(cache, "/datasets/cats/thumbnail-cache/img1.1024x1024.jpg");
    }

    #[test]
    fn files_without_extension_get_plain_suffix() {
        let cache = thumbnail_cache_path("/datasets/cats/img1", ThumbnailSize::new(64, 64));
        assert_eq!(cache, "/datasets/cats/thumbnail-cache/img1.64x64");
    }

    #[test]
    fn resolution_is_deterministic() {
        let size = ThumbnailSize::new(800, 600);
        let a = thumbnail_cache_path("/datasets/dogs/a.png", size);
        let b = thumbnail_cache_path("/datasets/dogs/a.png", size);
        assert_eq!(a, b);
        assert_eq!(a, "/datasets/dogs/thumbnail-cache/a.800x600.png");
    }

    #[test]
    fn parent_directory_strips_file_name() {
        assert_eq!(
            parent_directory("/datasets/cats/thumbnail-cache/img1.512x512.jpg").as_deref(),
            Some("/datasets/cats/thumbnail-cache")
        );
        assert_eq!(
            parent_directory("s3://media/datasets/img.jpg").as_deref(),
            Some("s3://media/datasets")
        );
    }

    #[cfg(feature = "storage-local")]
    mod locator {
        use crate::local::LocalStorage;
        use crate::thumbnail::{ThumbnailLocator, ThumbnailSize};
        use std::sync::Arc;
        use tempfile::tempdir;

        #[tokio::test]
        async fn resolve_creates_cache_directory_and_is_idempotent() {
            let dir = tempdir().unwrap();
            let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
            let locator = ThumbnailLocator::new(storage);

            let original = format!("{}/cats/img1.jpg", dir.path().display());
            let size = ThumbnailSize::new(512, 512);

            let first = locator.resolve(&original, size).await.unwrap();
            // Second call succeeds even though the directory already exists.
            let second = locator.resolve(&original, size).await.unwrap();

            assert_eq!(first, second);
            assert!(first.ends_with("/cats/thumbnail-cache/img1.512x512.jpg"));
            assert!(std::path::Path::new(&format!(
                "{}/cats/thumbnail-cache",
                dir.path().display()
            ))
            .is_dir());
        }
    }
}
