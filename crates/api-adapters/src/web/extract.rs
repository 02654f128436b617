//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domains::UserId;
use services::bearer_token;

use super::error::ApiError;
use super::state::AppState;

/// The verified caller. Handlers receive it as a plain value and pass it on
/// to the service explicitly.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let caller = state.credentials.verify_token(bearer_token(header))?;
        Ok(AuthUser(caller))
    }
}
