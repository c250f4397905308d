//! Annotation records
//!
//! Annotations are owned by the (excluded) annotation subsystem; the image
//! lifecycle only queries, counts, clones, and deletes them. The predicates
//! here decide which annotations take part in rendering and in
//! `copy_annotations`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::{events_from_json, metadata_from_json, Event, MetadataMap};

/// One annotation: COCO-style polygon segmentation over a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: i64,
    pub image_id: i64,
    pub dataset_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Geometry of the image this annotation was drawn on. Must match the
    /// target image for the annotation to be copyable.
    pub width: i32,
    pub height: i32,
    pub area: f64,
    /// Flat polygon point lists: `[x0, y0, x1, y1, ...]` per polygon.
    pub segmentation: Vec<Vec<f64>>,
    /// Display color as `#rrggbb`.
    pub color: Option<String>,
    pub deleted: bool,
    pub metadata: MetadataMap,
    pub events: Vec<Event>,
}

impl AnnotationRecord {
    /// An annotation is empty when no polygon has at least three points.
    pub fn is_empty(&self) -> bool {
        !self.segmentation.iter().any(|polygon| polygon.len() >= 6)
    }

    pub fn matches_geometry(&self, width: i32, height: i32) -> bool {
        self.width == width && self.height == height
    }

    /// Copy filter: geometry must match the target record and the area must
    /// be positive. Zero-area and mismatched annotations are silently
    /// skipped.
    pub fn eligible_for_copy(&self, width: i32, height: i32) -> bool {
        self.matches_geometry(width, height) && self.area > 0.0
    }
}

/// Database row for the annotations table; JSONB columns parsed on demand.
#[derive(Debug)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct AnnotationRow {
    pub id: i64,
    pub image_id: i64,
    pub dataset_id: Option<i64>,
    pub category_id: Option<i64>,
    pub width: i32,
    pub height: i32,
    pub area: f64,
    pub segmentation: JsonValue,
    pub color: Option<String>,
    pub deleted: bool,
    pub metadata: JsonValue,
    pub events: JsonValue,
}

impl AnnotationRow {
    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord {
            id: self.id,
            image_id: self.image_id,
            dataset_id: self.dataset_id,
            category_id: self.category_id,
            width: self.width,
            height: self.height,
            area: self.area,
            segmentation: serde_json::from_value(self.segmentation.clone()).unwrap_or_default(),
            color: self.color.clone(),
            deleted: self.deleted,
            metadata: metadata_from_json(&self.metadata),
            events: events_from_json(&self.events),
        }
    }
}
