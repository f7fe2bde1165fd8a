//! HTTP surface
//!
//! Routes, handlers and the JSON error mapping for the product API.

pub mod error;
pub mod products;

pub use error::ApiError;

use crate::app::App;
use crate::upload::MAX_FORM_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
