//! Annotia processing
//!
//! Image decode/compose/encode plus the `ImageService` lifecycle
//! orchestration: ingesting images, rendering them with their annotation
//! overlays, and maintaining the thumbnail cache.

pub mod render;
pub mod service;
pub mod thumbnail;

pub use render::{probe_dimensions, render, Draw, RenderedImage};
pub use service::{ImageService, LoadedImage, Thumbnail};
pub use thumbnail::thumbnail_jpeg;
