//! # api-adapters
//!
//! The web routing and orchestration layer for the catalog.
//! Enable `web-axum` for the axum implementation.

#[cfg(feature = "web-axum")]
pub mod web;

#[cfg(feature = "web-axum")]
pub use web::{router, ApiConfig, ApiError, AppState, AuthUser};
