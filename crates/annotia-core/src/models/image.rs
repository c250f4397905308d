//! Image records
//!
//! One record per ingested image. `ImageRow` is the raw database row;
//! `ImageRecord` is the domain shape with JSONB columns parsed. Width and
//! height are probed once at ingestion and never change afterwards; `path`
//! is globally unique and doubles as the thumbnail cache key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::{events_from_json, metadata_from_json, Dataset, Event, MetadataMap, User};

/// Path segment that marks the conventional dataset layout:
/// `/<...>/datasets/<dataset name>/<file>`.
pub const DATASET_PATH_MARKER: &str = "datasets";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub dataset_id: Option<i64>,
    pub category_ids: Vec<i64>,
    /// Absolute storage path or remote URI; unique across all records.
    pub path: String,
    pub file_name: String,
    pub width: i32,
    pub height: i32,
    pub annotated: bool,
    /// Users currently annotating this image. Maintained by the annotation
    /// subsystem; preserved opaquely here.
    pub annotating: Vec<String>,
    pub num_annotations: i32,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub date_captured: Option<DateTime<Utc>>,
    pub license: Option<i32>,
    pub metadata: MetadataMap,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Total annotation-session time, aggregated from session events.
    pub milliseconds: i64,
    pub events: Vec<Event>,
    /// Sticky until the next thumbnail read regenerates the cache.
    pub regenerate_thumbnail: bool,
}

/// A probed-but-unsaved image, produced by `create_from_path`.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub path: String,
    pub file_name: String,
    pub width: i32,
    pub height: i32,
    pub dataset_id: Option<i64>,
}

/// Capability answers for one user against one image.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImagePermissions {
    pub delete: bool,
    pub download: bool,
}

impl ImageRecord {
    pub fn permissions(&self, user: &User, dataset: Option<&Dataset>) -> ImagePermissions {
        ImagePermissions {
            delete: user.can_delete(dataset),
            download: user.can_download(dataset),
        }
    }
}

/// Extract the dataset name from a path laid out under the marker
/// directory. The FIRST segment equal to the marker wins; a marker with no
/// following segment yields `None`. Works on plain paths and on URIs, since
/// scheme and host never collide with the bare marker segment.
pub fn dataset_name_from_path(path: &str) -> Option<&str> {
    let mut segments = path.split('/');
    segments
        .by_ref()
        .find(|segment| *segment == DATASET_PATH_MARKER)?;
    segments.next().filter(|name| !name.is_empty())
}

/// Database row for the images table.
#[derive(Debug)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct ImageRow {
    pub id: i64,
    pub dataset_id: Option<i64>,
    pub category_ids: Vec<i64>,
    pub path: String,
    pub file_name: String,
    pub width: i32,
    pub height: i32,
    pub annotated: bool,
    pub annotating: Vec<String>,
    pub num_annotations: i32,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub date_captured: Option<DateTime<Utc>>,
    pub license: Option<i32>,
    pub metadata: JsonValue,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub milliseconds: i64,
    pub events: JsonValue,
    pub regenerate_thumbnail: bool,
}

impl ImageRow {
    pub fn to_record(&self) -> ImageRecord {
        ImageRecord {
            id: self.id,
            dataset_id: self.dataset_id,
            category_ids: self.category_ids.clone(),
            path: self.path.clone(),
            file_name: self.file_name.clone(),
            width: self.width,
            height: self.height,
            annotated: self.annotated,
            annotating: self.annotating.clone(),
            num_annotations: self.num_annotations,
            thumbnail_url: self.thumbnail_url.clone(),
            image_url: self.image_url.clone(),
            source_url: self.source_url.clone(),
            date_captured: self.date_captured,
            license: self.license,
            metadata: metadata_from_json(&self.metadata),
            deleted: self.deleted,
            deleted_at: self.deleted_at,
            milliseconds: self.milliseconds,
            events: events_from_json(&self.events),
            regenerate_thumbnail: self.regenerate_thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_name_follows_marker_segment() {
        assert_eq!(
            dataset_name_from_path("/datasets/cats/img1.jpg"),
            Some("cats")
        );
        assert_eq!(
            dataset_name_from_path("/mnt/shared/datasets/birds/2021/img.png"),
            Some("birds")
        );
    }

    #[test]
    fn dataset_name_works_on_remote_uris() {
        assert_eq!(
            dataset_name_from_path("s3://bucket/datasets/dogs/pup.jpg"),
            Some("dogs")
        );
    }

    #[test]
    fn first_marker_occurrence_wins() {
        assert_eq!(
            dataset_name_from_path("/datasets/cats/datasets/nested.jpg"),
            Some("cats")
        );
    }

    #[test]
    fn missing_or_trailing_marker_yields_none() {
        assert_eq!(dataset_name_from_path("/uploads/cats/img1.jpg"), None);
        assert_eq!(dataset_name_from_path("/datasets"), None);
        assert_eq!(dataset_name_from_path("/datasets/"), None);
    }

    #[test]
    fn permissions_delegate_to_user_capabilities() {
        let record = ImageRecord {
            id: 1,
            dataset_id: None,
            category_ids: vec![],
            path: "/datasets/cats/img1.jpg".into(),
            file_name: "img1.jpg".into(),
            width: 640,
            height: 480,
            annotated: false,
            annotating: vec![],
            num_annotations: 0,
            thumbnail_url: None,
            image_url: None,
            source_url: None,
            date_captured: None,
            license: None,
            metadata: MetadataMap::new(),
            deleted: false,
            deleted_at: None,
            milliseconds: 0,
            events: vec![],
            regenerate_thumbnail: false,
        };
        let admin = User {
            username: "root".into(),
            is_admin: true,
        };
        let perms = record.permissions(&admin, None);
        assert!(perms.delete);
        assert!(perms.download);
    }
}
