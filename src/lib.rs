//! Product catalog API - stores catalog products with images served from a CDN
//!
//! Accepts product submissions as multipart forms, uploads the image to a
//! Cloudinary-compatible media service, persists the record in MongoDB and
//! lists products newest first with derived delivery URLs.

pub mod api;
pub mod app;
pub mod error;
pub mod media;
pub mod models;
pub mod store;
pub mod upload;
pub mod validation;

pub use error::{Error, Result};
