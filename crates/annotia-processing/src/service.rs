//! Image lifecycle service
//!
//! Orchestrates storage, repositories, and the imaging routines behind the
//! operations the rest of the application calls: ingesting an image from a
//! path, rendering it with its annotations, serving and maintaining the
//! thumbnail cache, copying annotations, and the delete cascade.

use annotia_core::models::{
    dataset_name_from_path, Dataset, Event, ImagePermissions, ImageRecord, NewImage, User,
};
use annotia_core::AppError;
use annotia_db::{AnnotationRepository, DatasetRepository, ImageRepository};
use annotia_storage::{
    thumbnail_cache_path, Storage, ThumbnailLocator, ThumbnailSize,
};
use bytes::Bytes;
use image::DynamicImage;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::render::{render, RenderedImage};
use crate::thumbnail::thumbnail_jpeg;

/// Thumbnail read result: the encoded bytes, or just the cache location.
pub enum Thumbnail {
    Data(Bytes),
    CachePath(String),
}

/// An image record with its owning dataset resolved lazily and cached for
/// the lifetime of this in-memory instance. The cache is never persisted.
pub struct LoadedImage {
    pub record: ImageRecord,
    dataset: OnceCell<Option<Dataset>>,
}

impl LoadedImage {
    pub fn new(record: ImageRecord) -> Self {
        Self {
            record,
            dataset: OnceCell::new(),
        }
    }

    /// Resolve the owning dataset. The first call hits the repository;
    /// later calls reuse the cached reference. An unset dataset id or a
    /// lookup miss is a valid `None`, not an error.
    pub async fn dataset(
        &self,
        datasets: &DatasetRepository,
    ) -> Result<Option<&Dataset>, AppError> {
        let cached = self
            .dataset
            .get_or_try_init(|| async {
                match self.record.dataset_id {
                    Some(id) => datasets.get_by_id(id).await,
                    None => Ok(None),
                }
            })
            .await?;
        Ok(cached.as_ref())
    }
}

#[derive(Clone)]
pub struct ImageService {
    storage: Arc<dyn Storage>,
    locator: ThumbnailLocator,
    images: ImageRepository,
    annotations: AnnotationRepository,
    datasets: DatasetRepository,
}

impl ImageService {
    pub fn new(pool: PgPool, storage: Arc<dyn Storage>) -> Self {
        Self {
            locator: ThumbnailLocator::new(storage.clone()),
            storage,
            images: ImageRepository::new(pool.clone()),
            annotations: AnnotationRepository::new(pool.clone()),
            datasets: DatasetRepository::new(pool),
        }
    }

    pub fn images(&self) -> &ImageRepository {
        &self.images
    }

    pub async fn load(&self, id: i64) -> Result<Option<LoadedImage>, AppError> {
        Ok(self.images.get(id).await?.map(LoadedImage::new))
    }

    /// Probe an image file into an unsaved record. Dimensions come from
    /// decoding the stored bytes; a file that cannot be opened or decoded
    /// fails the operation. Without an explicit dataset id the dataset is
    /// inferred from the conventional `datasets/<name>` path layout, and
    /// stays unset when the layout or the dataset is absent.
    pub async fn create_from_path(
        &self,
        path: &str,
        dataset_id: Option<i64>,
    ) -> Result<NewImage, AppError> {
        let data = self.storage.read(path).await?;

        let (width, height) = tokio::task::spawn_blocking(move || {
            crate::render::probe_dimensions(&data)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Decode task panicked: {}", e)))?
        .map_err(|e| AppError::ImageProcessing(e.to_string()))?;

        let dataset_id = match dataset_id {
            Some(id) => Some(id),
            None => match dataset_name_from_path(path) {
                Some(name) => self.datasets.get_by_name(name).await?.map(|ds| ds.id),
                None => None,
            },
        };

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();

        Ok(NewImage {
            path: path.to_string(),
            file_name,
            width: width as i32,
            height: height as i32,
            dataset_id,
        })
    }

    /// Probe and persist in one step.
    pub async fn ingest(
        &self,
        path: &str,
        dataset_id: Option<i64>,
    ) -> Result<ImageRecord, AppError> {
        let new = self.create_from_path(path, dataset_id).await?;
        let record = self.images.insert(&new).await?;
        tracing::info!(
            image_id = record.id,
            path = %record.path,
            width = record.width,
            height = record.height,
            dataset_id = record.dataset_id,
            "Image ingested"
        );
        Ok(record)
    }

    /// Decode the stored file and compose all non-deleted, non-empty
    /// annotations onto it.
    pub async fn render(&self, record: &ImageRecord) -> Result<RenderedImage, AppError> {
        let data = self.storage.read(&record.path).await?;
        let annotations = self.annotations.active_for_image(record.id).await?;
        let path = record.path.clone();

        tokio::task::spawn_blocking(move || render(&path, &data, &annotations))
            .await
            .map_err(|e| AppError::Internal(format!("Render task panicked: {}", e)))?
            .map_err(|e| AppError::ImageProcessing(e.to_string()))
    }

    /// Serve the cached thumbnail, regenerating it when the record's
    /// sticky flag is set or no cache file exists at the resolved path.
    ///
    /// Two concurrent requests for the same missing thumbnail may both
    /// regenerate it; there is no locking. Identical inputs produce
    /// identical output, so the last writer wins and only work is wasted.
    pub async fn thumbnail(
        &self,
        record: &ImageRecord,
        size: Option<ThumbnailSize>,
        path_only: bool,
    ) -> Result<Thumbnail, AppError> {
        let size = size.unwrap_or_default();
        let cache_path = self.locator.resolve(&record.path, size).await?;

        let cached = self.storage.exists(&cache_path).await?;
        if !record.regenerate_thumbnail && cached {
            return if path_only {
                Ok(Thumbnail::CachePath(cache_path))
            } else {
                Ok(Thumbnail::Data(Bytes::from(
                    self.storage.read(&cache_path).await?,
                )))
            };
        }

        tracing::debug!(image_id = record.id, size_w = size.width, size_h = size.height, "Generating thumbnail");

        let rendered = self.render(record).await?;
        let encoded = tokio::task::spawn_blocking(move || {
            thumbnail_jpeg(DynamicImage::ImageRgba8(rendered.image), size)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Encode task panicked: {}", e)))?
        .map_err(|e| AppError::ImageProcessing(e.to_string()))?;

        self.storage.write(&cache_path, encoded.to_vec()).await?;

        // Clear the sticky flag with a targeted update; a cache rebuild is
        // not a content modification.
        self.images.clear_regenerate_thumbnail(record.id).await?;

        if path_only {
            Ok(Thumbnail::CachePath(cache_path))
        } else {
            Ok(Thumbnail::Data(encoded))
        }
    }

    /// Toggle the regenerate flag. Writes only when the value changes;
    /// returns whether a write happened.
    pub async fn flag_thumbnail(
        &self,
        record: &ImageRecord,
        flag: bool,
    ) -> Result<bool, AppError> {
        if record.regenerate_thumbnail == flag {
            return Ok(false);
        }
        self.images.set_regenerate_thumbnail(record.id, flag).await?;
        Ok(true)
    }

    /// Remove an image and everything that references it. Order matters:
    /// the thumbnail cache file goes first (absence ignored), then the
    /// annotation rows, then the record itself — a crash mid-way leaves at
    /// most an orphaned thumbnail or annotations, never a live record with
    /// dangling references.
    pub async fn delete(&self, record: &ImageRecord) -> Result<(), AppError> {
        let cache_path = thumbnail_cache_path(&record.path, ThumbnailSize::default());
        self.storage.delete(&cache_path).await?;

        let removed = self.annotations.delete_for_image(record.id).await?;
        self.images.delete(record.id).await?;

        tracing::info!(
            image_id = record.id,
            path = %record.path,
            annotations_removed = removed,
            "Image deleted"
        );

        Ok(())
    }

    /// Copy annotations from another image onto `record`. Only annotations
    /// whose geometry matches the record and whose area is positive are
    /// cloned; clones are re-parented to the record's dataset and id and
    /// carry no event history. Returns the number of annotations cloned.
    pub async fn copy_annotations(
        &self,
        record: &ImageRecord,
        source_image_id: i64,
    ) -> Result<usize, AppError> {
        let eligible = self
            .annotations
            .eligible_for_copy(source_image_id, record.width, record.height)
            .await?;

        for annotation in &eligible {
            self.annotations
                .clone_to(annotation, record.dataset_id, record.id)
                .await?;
        }

        Ok(eligible.len())
    }

    /// Append an event to the record's audit trail; session events also
    /// bump the millisecond counter in the same atomic update.
    pub async fn add_event(&self, record: &ImageRecord, event: &Event) -> Result<(), AppError> {
        self.images.add_event(record.id, event).await
    }

    /// Capability answers for `user` against this image's dataset.
    pub async fn permissions(
        &self,
        image: &LoadedImage,
        user: &User,
    ) -> Result<ImagePermissions, AppError> {
        let dataset = image.dataset(&self.datasets).await?;
        Ok(image.record.permissions(user, dataset))
    }

    pub async fn can_delete(&self, image: &LoadedImage, user: &User) -> Result<bool, AppError> {
        Ok(self.permissions(image, user).await?.delete)
    }

    pub async fn can_download(&self, image: &LoadedImage, user: &User) -> Result<bool, AppError> {
        Ok(self.permissions(image, user).await?.download)
    }
}
