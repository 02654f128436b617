use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{AuthResponse, Credentials, PublicUser};

use crate::web::error::ApiError;
use crate::web::extract::AuthUser;
use crate::web::state::AppState;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(credentials) = body?;
    let created = state.credentials.register(credentials).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(credentials) = body?;
    Ok(Json(state.credentials.login(credentials).await?))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(state.credentials.current_user(caller).await?))
}
