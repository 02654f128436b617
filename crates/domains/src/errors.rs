//! # DomainError
//!
//! Centralized error handling for the catalog.
//! Adapters translate their own failures into one of these variants so the
//! service layer and the HTTP layer only ever reason about domain outcomes.

use thiserror::Error;

/// The primary error type for all catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input (e.g. rating out of range, empty name)
    #[error("{0}")]
    Validation(String),

    /// Request body over the configured size limit
    #[error("{0}")]
    TooLarge(String),

    /// No credential presented, or login credentials rejected
    #[error("{0}")]
    Unauthenticated(String),

    /// A token was presented but is malformed, tampered with or expired
    #[error("invalid or expired token")]
    InvalidToken,

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found, or a cross-reference did not match
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate unique key (e.g. email already registered)
    #[error("{0}")]
    Conflict(String),

    /// Infrastructure failure (database down, filesystem error)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for catalog logic.
pub type Result<T> = std::result::Result<T, DomainError>;
