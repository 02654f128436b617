//! # domains
//!
//! Entities, input schemas, errors and port traits for the product catalog.
//! This crate performs no I/O.

pub mod errors;
pub mod inputs;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use inputs::*;
pub use models::*;
pub use ports::*;

/// Trim and lower-case an email address for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.Com \n"), "a@x.com");
    }
}
