//! Annotia database layer
//!
//! Postgres repositories for the image, annotation, and dataset tables.

pub mod db;

pub use db::{AnnotationRepository, DatasetRepository, ImageRepository};

/// Run pending schema migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
