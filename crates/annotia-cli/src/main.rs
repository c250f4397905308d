//! Annotia CLI — operator tool for the image store.
//!
//! Reads configuration from the environment (see annotia-core config);
//! DATABASE_URL and the storage backend settings must point at the live
//! deployment.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use annotia_cli::init_tracing;
use annotia_core::models::Event;
use annotia_core::Config;
use annotia_processing::{ImageService, Thumbnail};
use annotia_storage::{create_storage, ThumbnailSize, UrlSigner};

#[derive(Parser)]
#[command(name = "annotia", about = "Annotia image store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one image file into the store
    Ingest {
        /// Absolute path or s3:// URI of the image
        path: String,
        /// Dataset id; inferred from the path layout when omitted
        #[arg(long)]
        dataset: Option<i64>,
    },
    /// Print an image record as JSON
    Show {
        /// Image id
        id: i64,
    },
    /// Generate or fetch a thumbnail
    Thumbnail {
        /// Image id
        id: i64,
        /// Envelope width in pixels
        #[arg(long, default_value = "1024")]
        width: u32,
        /// Envelope height in pixels
        #[arg(long, default_value = "1024")]
        height: u32,
        /// Print the cache path instead of writing bytes
        #[arg(long)]
        path_only: bool,
        /// File to write the thumbnail bytes to
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },
    /// Set or clear the regenerate-thumbnail flag
    FlagThumbnail {
        /// Image id
        id: i64,
        /// Clear the flag instead of setting it
        #[arg(long)]
        clear: bool,
    },
    /// Copy matching annotations from another image
    CopyAnnotations {
        /// Target image id
        id: i64,
        /// Source image id
        #[arg(long)]
        from: i64,
    },
    /// Record an annotation session against an image
    AddSession {
        /// Image id
        id: i64,
        /// Session duration in milliseconds
        milliseconds: i64,
        /// Username the session belongs to
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete an image, its thumbnail, and its annotations
    Delete {
        /// Image id
        id: i64,
    },
    /// Generate a presigned URL for an s3:// image
    SignUrl {
        /// s3://bucket/key URI
        uri: String,
        /// Validity in seconds
        #[arg(long, default_value = "3600")]
        expires: u64,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize record")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&config.database_url)
        .await
        .context("Connect to database")?;
    annotia_db::run_migrations(&pool).await?;

    let storage = create_storage(&config)
        .await
        .context("Initialize storage backend")?;
    let service = ImageService::new(pool, storage);

    match cli.command {
        Commands::Ingest { path, dataset } => {
            let record = service.ingest(&path, dataset).await?;
            print_json(&record)?;
        }
        Commands::Show { id } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            print_json(&image.record)?;
        }
        Commands::Thumbnail {
            id,
            width,
            height,
            path_only,
            out,
        } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            let size = ThumbnailSize::new(width, height);
            match service
                .thumbnail(&image.record, Some(size), path_only)
                .await?
            {
                Thumbnail::CachePath(path) => println!("{}", path),
                Thumbnail::Data(bytes) => match out {
                    Some(file) => {
                        tokio::fs::write(&file, &bytes).await?;
                        println!("{}", file.display());
                    }
                    None => println!("{} bytes (use --out to save)", bytes.len()),
                },
            }
        }
        Commands::FlagThumbnail { id, clear } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            let changed = service.flag_thumbnail(&image.record, !clear).await?;
            println!("{}", if changed { "updated" } else { "unchanged" });
        }
        Commands::CopyAnnotations { id, from } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            let copied = service.copy_annotations(&image.record, from).await?;
            println!("{} annotations copied", copied);
        }
        Commands::AddSession {
            id,
            milliseconds,
            user,
        } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            service
                .add_event(&image.record, &Event::session(milliseconds, user))
                .await?;
            println!("recorded");
        }
        Commands::Delete { id } => {
            let image = service
                .load(id)
                .await?
                .with_context(|| format!("No image with id {}", id))?;
            service.delete(&image.record).await?;
            println!("deleted");
        }
        Commands::SignUrl { uri, expires } => {
            let signer = UrlSigner::new(config.s3_region.clone(), config.s3_endpoint.clone());
            let url = signer
                .sign(&uri, Duration::from_secs(expires), None)
                .await
                .map_err(annotia_core::AppError::from)?;
            println!("{}", url);
        }
    }

    Ok(())
}
