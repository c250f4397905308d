//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific feature area.

mod annotation;
mod dataset;
mod event;
mod image;
mod metadata;
mod user;

// Re-export all models for convenient imports
pub use annotation::*;
pub use dataset::*;
pub use event::*;
pub use image::*;
pub use metadata::*;
pub use user::*;
