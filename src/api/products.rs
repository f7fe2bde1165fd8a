use super::ApiError;
use crate::app::App;
use crate::models::Product;
use crate::upload::ProductForm;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// `POST /api/products`
#[instrument(name = "handler::create_product", skip_all)]
pub async fn create_product(
    State(app): State<Arc<App>>,
    form: ProductForm,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let image = form.image.ok_or(ApiError::ImageRequired)?;
    let product = app.create_product(&form.fields, image).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products`
#[instrument(name = "handler::list_products", skip_all)]
pub async fn list_products(State(app): State<Arc<App>>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = app.list_products().await?;
    Ok(Json(products))
}
