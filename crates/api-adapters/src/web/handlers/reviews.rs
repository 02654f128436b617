use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{NewReview, ProductId, Review, ReviewId, ReviewPatch};

use crate::web::error::{path_not_found, ApiError};
use crate::web::extract::AuthUser;
use crate::web::state::AppState;

/// `POST /api/products/{id}/reviews`
pub async fn add(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<ProductId>, PathRejection>,
    body: Result<Json<NewReview>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let Path(product_id) = path.map_err(path_not_found("product"))?;
    let Json(input) = body?;
    let review = state.reviews.add_review(caller, product_id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// `PUT /api/products/{id}/reviews/{review_id}`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<(ProductId, ReviewId)>, PathRejection>,
    body: Result<Json<ReviewPatch>, JsonRejection>,
) -> Result<Json<Review>, ApiError> {
    let Path((product_id, review_id)) = path.map_err(path_not_found("review"))?;
    let Json(patch) = body?;
    let review = state
        .reviews
        .update_review(caller, product_id, review_id, patch)
        .await?;
    Ok(Json(review))
}

/// `DELETE /api/products/{id}/reviews/{review_id}`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<(ProductId, ReviewId)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((product_id, review_id)) = path.map_err(path_not_found("review"))?;
    state
        .reviews
        .delete_review(caller, product_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
