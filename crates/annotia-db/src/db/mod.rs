//! Database repositories for the data access layer
//!
//! Each repository owns the queries for one table and returns clean domain
//! models; JSONB and array columns are parsed at the row boundary.

pub mod annotation;
pub mod dataset;
pub mod image;

pub use annotation::AnnotationRepository;
pub use dataset::DatasetRepository;
pub use image::ImageRepository;

const IMAGE_COLUMNS: &str = "id, dataset_id, category_ids, path, file_name, width, height, \
     annotated, annotating, num_annotations, thumbnail_url, image_url, source_url, \
     date_captured, license, metadata, deleted, deleted_at, milliseconds, events, \
     regenerate_thumbnail";

const ANNOTATION_COLUMNS: &str = "id, image_id, dataset_id, category_id, width, height, area, \
     segmentation, color, deleted, metadata, events";
