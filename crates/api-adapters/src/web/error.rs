//! Domain errors rendered as `{"error": "..."}` responses.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            DomainError::InvalidToken | DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

/// Body-level failures are the client's fault; only the size limit gets its
/// own status.
pub(crate) fn body_error(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(DomainError::TooLarge(message))
    } else {
        ApiError(DomainError::validation(message))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        body_error(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        body_error(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            DomainError::Internal(detail) => {
                error!(%detail, "request failed");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Unparseable ids in the path cannot name an existing resource.
pub fn path_not_found(what: &'static str) -> impl FnOnce(PathRejection) -> ApiError {
    move |_| ApiError(DomainError::not_found(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::TooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (DomainError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::InvalidToken, StatusCode::FORBIDDEN),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::not_found("product"), StatusCode::NOT_FOUND),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::internal("db down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn only_the_size_limit_escapes_validation() {
        assert_eq!(
            body_error(StatusCode::PAYLOAD_TOO_LARGE, "big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            body_error(StatusCode::UNPROCESSABLE_ENTITY, "bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let response = ApiError(DomainError::internal("password=hunter2")).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }
}
