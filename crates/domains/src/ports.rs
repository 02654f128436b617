//! # Ports
//!
//! Every adapter crate implements one or more of these traits; the service
//! layer only ever sees them as `Arc<dyn Trait>`.

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{Product, ProductId, Review, ReviewId, Upload, User, UserId};

/// Persistence contract for accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the (normalized) email is already taken.
    /// The check must be atomic with the insert.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;
}

/// Persistence contract for products.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in creation order.
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn insert_product(&self, product: Product) -> Result<()>;
    /// Overwrites the stored document (last writer wins).
    async fn update_product(&self, product: Product) -> Result<()>;
    /// Removes every review referencing the product, then the product.
    /// Returns `false` if the product did not exist.
    async fn delete_product_cascade(&self, id: ProductId) -> Result<bool>;
}

/// Persistence contract for reviews.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews of the given products, in storage order.
    async fn list_reviews_for(&self, product_ids: &[ProductId]) -> Result<Vec<Review>>;
    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>>;
    async fn insert_review(&self, review: Review) -> Result<()>;
    async fn update_review(&self, review: Review) -> Result<()>;
    async fn delete_review(&self, id: ReviewId) -> Result<()>;
}

/// One-way password digests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String>;
    /// `Ok(false)` on mismatch; `Err` only for infrastructure failures.
    async fn verify(&self, password: &str, digest: &str) -> Result<bool>;
}

/// Bearer token signing and verification.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<String>;
    /// Fails with `InvalidToken` for malformed, tampered or expired tokens.
    fn verify(&self, token: &str) -> Result<UserId>;
}

/// Durable storage for uploaded images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persists the upload and returns the public path to record on the
    /// owning document. Must not return before the file is durable.
    async fn store(&self, upload: Upload) -> Result<String>;
}
