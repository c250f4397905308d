//! Image repository

use annotia_core::models::{Event, ImageRecord, ImageRow, NewImage};
use annotia_core::AppError;
use sqlx::PgPool;

use super::IMAGE_COLUMNS;

#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a probed image. The path is globally unique; inserting a
    /// duplicate surfaces the database error unchanged.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "insert"))]
    pub async fn insert(&self, new: &NewImage) -> Result<ImageRecord, AppError> {
        let row: ImageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO images (path, file_name, width, height, dataset_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(&new.path)
        .bind(&new.file_name)
        .bind(new.width)
        .bind(new.height)
        .bind(new.dataset_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.to_record())
    }

    pub async fn get(&self, id: i64) -> Result<Option<ImageRecord>, AppError> {
        let row: Option<ImageRow> =
            sqlx::query_as(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.to_record()))
    }

    pub async fn get_by_path(&self, path: &str) -> Result<Option<ImageRecord>, AppError> {
        let row: Option<ImageRow> =
            sqlx::query_as(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE path = $1"))
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.to_record()))
    }

    /// Set the regenerate flag. Callers check the current value first to
    /// avoid redundant writes; this update is unconditional.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "update"))]
    pub async fn set_regenerate_thumbnail(&self, id: i64, flag: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE images SET regenerate_thumbnail = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(flag)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clear the regenerate flag after a cache rebuild. Deliberately does
    /// not touch `updated_at`: regeneration must not look like a content
    /// modification to downstream consumers.
    pub async fn clear_regenerate_thumbnail(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE images SET regenerate_thumbnail = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append an event to the audit trail. The JSONB append and the
    /// millisecond increment happen in one UPDATE so concurrent writers
    /// never lose a session's contribution.
    #[tracing::instrument(skip(self, event), fields(db.table = "images", db.operation = "update"))]
    pub async fn add_event(&self, id: i64, event: &Event) -> Result<(), AppError> {
        let entry = serde_json::to_value(vec![event])?;

        sqlx::query(
            r#"
            UPDATE images
            SET events = events || $2::jsonb,
                milliseconds = milliseconds + $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(entry)
        .bind(event.session_milliseconds())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a record soft-deleted. The physical removal happens through the
    /// image service's delete cascade.
    pub async fn mark_deleted(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE images SET deleted = TRUE, deleted_at = now(), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove the row. Thumbnail and annotations must already be gone; the
    /// image service owns that ordering.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "delete"))]
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
