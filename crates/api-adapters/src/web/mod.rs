//! axum implementation of the HTTP interface.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod multipart;
pub mod state;

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn};

pub use error::ApiError;
pub use extract::AuthUser;
pub use state::{ApiConfig, AppState};

/// Builds the full application: JSON API under `/api`, uploaded images under
/// the configured prefix, and a liveness check.
pub fn router(state: AppState, config: &ApiConfig) -> Router {
    let api = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/products",
            get(handlers::products::list).post(handlers::products::create),
        )
        .route(
            "/products/{id}",
            put(handlers::products::update).delete(handlers::products::remove),
        )
        .route("/products/{id}/reviews", post(handlers::reviews::add))
        .route(
            "/products/{id}/reviews/{review_id}",
            put(handlers::reviews::update).delete(handlers::reviews::remove),
        );

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors_policy(&config.allowed_origin));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .nest_service(&config.url_prefix, ServeDir::new(&config.upload_dir))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware)
        .with_state(state)
}

/// CORS for the single configured frontend origin.
fn cors_policy(origin: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match origin.parse::<HeaderValue>() {
        Ok(origin) => base.allow_origin(origin),
        Err(_) => {
            warn!(%origin, "invalid allowed origin, cross-origin requests will be refused");
            base
        }
    }
}
