//! # auth-adapters
//!
//! Password digests (argon2) and bearer tokens (JWT, feature `auth-jwt`).

pub mod argon;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use argon::Argon2Hasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenIssuer;
