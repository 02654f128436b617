use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Product, ProductId, ProductWithReviews};

use crate::web::error::{path_not_found, ApiError};
use crate::web::extract::AuthUser;
use crate::web::multipart::read_product_form;
use crate::web::state::AppState;

/// `GET /api/products`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductWithReviews>>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    form: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let form = read_product_form(form?).await?;
    let product = state.catalog.create_product(caller, form.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<ProductId>, PathRejection>,
    form: Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(product_id) = path.map_err(path_not_found("product"))?;
    // Ownership is settled before the body is read.
    state.catalog.owned_product(caller, product_id).await?;
    let form = read_product_form(form?).await?;
    let product = state
        .catalog
        .update_product(caller, product_id, form.into())
        .await?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(product_id) = path.map_err(path_not_found("product"))?;
    state.catalog.delete_product(caller, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
