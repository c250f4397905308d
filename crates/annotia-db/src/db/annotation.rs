//! Annotation repository
//!
//! Annotations are created and edited by the annotation subsystem; the
//! image lifecycle needs them for rendering, copying, and the delete
//! cascade.

use annotia_core::models::{AnnotationRecord, AnnotationRow};
use annotia_core::AppError;
use sqlx::PgPool;

use super::ANNOTATION_COLUMNS;

#[derive(Clone)]
pub struct AnnotationRepository {
    pool: PgPool,
}

impl AnnotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All non-deleted annotations for an image, in id order. Rendering
    /// composes them in exactly this order.
    pub async fn active_for_image(&self, image_id: i64) -> Result<Vec<AnnotationRecord>, AppError> {
        let rows: Vec<AnnotationRow> = sqlx::query_as(&format!(
            "SELECT {ANNOTATION_COLUMNS} FROM annotations \
             WHERE image_id = $1 AND deleted = FALSE ORDER BY id"
        ))
        .bind(image_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.to_record()).collect())
    }

    /// Source annotations eligible for copying onto a target of the given
    /// geometry: matching width/height and positive area.
    pub async fn eligible_for_copy(
        &self,
        image_id: i64,
        width: i32,
        height: i32,
    ) -> Result<Vec<AnnotationRecord>, AppError> {
        let rows: Vec<AnnotationRow> = sqlx::query_as(&format!(
            "SELECT {ANNOTATION_COLUMNS} FROM annotations \
             WHERE image_id = $1 AND width = $2 AND height = $3 AND area > 0 ORDER BY id"
        ))
        .bind(image_id)
        .bind(width)
        .bind(height)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.to_record()).collect())
    }

    /// Insert a duplicate of `annotation`, re-parented to the given dataset
    /// and image. The audit-event history is not carried over.
    #[tracing::instrument(
        skip(self, annotation),
        fields(db.table = "annotations", db.operation = "insert")
    )]
    pub async fn clone_to(
        &self,
        annotation: &AnnotationRecord,
        dataset_id: Option<i64>,
        image_id: i64,
    ) -> Result<i64, AppError> {
        let segmentation = serde_json::to_value(&annotation.segmentation)?;
        let metadata = annotia_core::models::metadata_to_json(&annotation.metadata);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO annotations (
                image_id, dataset_id, category_id, width, height, area,
                segmentation, color, deleted, metadata, events
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, '[]'::jsonb)
            RETURNING id
            "#,
        )
        .bind(image_id)
        .bind(dataset_id)
        .bind(annotation.category_id)
        .bind(annotation.width)
        .bind(annotation.height)
        .bind(annotation.area)
        .bind(segmentation)
        .bind(&annotation.color)
        .bind(annotation.deleted)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn count_for_image(&self, image_id: i64) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM annotations WHERE image_id = $1")
                .bind(image_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Remove every annotation referencing an image. Part of the image
    /// delete cascade; runs before the image row disappears.
    #[tracing::instrument(skip(self), fields(db.table = "annotations", db.operation = "delete"))]
    pub async fn delete_for_image(&self, image_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM annotations WHERE image_id = $1")
            .bind(image_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
