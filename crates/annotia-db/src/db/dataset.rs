//! Dataset repository
//!
//! Lookup misses are a valid "unset" state, not errors; both getters
//! return `Option`.

use annotia_core::models::Dataset;
use annotia_core::AppError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct DatasetRepository {
    pool: PgPool,
}

impl DatasetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Dataset>, AppError> {
        let dataset: Option<Dataset> = sqlx::query_as(
            "SELECT id, name, directory, owner, users, created_at FROM datasets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dataset)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Dataset>, AppError> {
        let dataset: Option<Dataset> = sqlx::query_as(
            "SELECT id, name, directory, owner, users, created_at FROM datasets WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dataset)
    }
}
