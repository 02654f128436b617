//! # Domain Models
//!
//! These structs represent the core entities of the catalog.
//! We use UUID v7 for time-ordered, globally unique identification, so
//! ordering by id is ordering by creation time.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, Result};

pub type UserId = Uuid;
pub type ProductId = Uuid;
pub type ReviewId = Uuid;

/// A registered account. Deliberately not `Serialize`: the digest must never
/// reach a client, use [`PublicUser`] for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Trimmed and lower-cased
    pub email: String,
    /// argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The client-visible projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Set at creation, immutable afterwards
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Server-relative path under the static upload prefix, or empty
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A star rating in `1..=5`. Can only be built through [`Rating::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::validation(format!(
                "rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.0 as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    /// The author. Ownership is always derived from this, never from `author_name`.
    pub user_id: UserId,
    pub rating: Rating,
    pub text: String,
    /// Optional display label, empty when not given
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with its reviews for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWithReviews {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// Raw upload handed to a `MediaStorage`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: mime::Mime,
    pub data: Bytes,
}

/// Anything with a single owning account.
pub trait Owned {
    fn owner_id(&self) -> UserId;
    /// Human-readable resource name used in error messages
    fn kind(&self) -> &'static str;
}

impl Owned for Product {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn kind(&self) -> &'static str {
        "product"
    }
}

impl Owned for Review {
    fn owner_id(&self) -> UserId {
        self.user_id
    }

    fn kind(&self) -> &'static str {
        "review"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_bounds_only() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert!(Rating::new(6).is_err());
    }

    #[test]
    fn rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("3").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn product_with_reviews_flattens_product_fields() {
        let now = Utc::now();
        let view = ProductWithReviews {
            product: Product {
                id: Uuid::now_v7(),
                owner_id: Uuid::now_v7(),
                name: "Chair".into(),
                description: String::new(),
                image_path: String::new(),
                created_at: now,
                updated_at: now,
            },
            reviews: vec![],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Chair");
        assert_eq!(json["imagePath"], "");
        assert_eq!(json["reviews"], serde_json::json!([]));
        assert!(json.get("product").is_none());
    }
}
