//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror.
//! HTTP status mapping lives in [`crate::api::ApiError`].

use crate::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media service error: {0}")]
    Media(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
