//! # MemoryStore
//!
//! Process-local implementation of every repository port, backed by
//! `DashMap`s. Used by the test suites and for running the server without a
//! database. Each document carries an insertion sequence number so listings
//! come back in storage order.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    DomainError, Product, ProductId, ProductRepository, Result, Review, ReviewId,
    ReviewRepository, User, UserId, UserRepository,
};

struct Stored<T> {
    seq: u64,
    doc: T,
}

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    /// Unique index: normalized email → user id
    emails: DashMap<String, UserId>,
    products: DashMap<ProductId, Stored<Product>>,
    reviews: DashMap<ReviewId, Stored<Review>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Total number of stored reviews, across all products.
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

fn sorted<T: Clone>(mut rows: Vec<(u64, T)>) -> Vec<T> {
    rows.sort_by_key(|(seq, _)| *seq);
    rows.into_iter().map(|(_, doc)| doc).collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict("email already in use".into())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = self
            .products
            .iter()
            .map(|e| (e.seq, e.doc.clone()))
            .collect();
        Ok(sorted(rows))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.get(&id).map(|e| e.doc.clone()))
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        let seq = self.next_seq();
        self.products.insert(product.id, Stored { seq, doc: product });
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        match self.products.get_mut(&product.id) {
            Some(mut entry) => {
                entry.doc = product;
                Ok(())
            }
            None => Err(DomainError::not_found("product")),
        }
    }

    async fn delete_product_cascade(&self, id: ProductId) -> Result<bool> {
        if !self.products.contains_key(&id) {
            return Ok(false);
        }
        // Reviews go first, then the product.
        self.reviews.retain(|_, r| r.doc.product_id != id);
        Ok(self.products.remove(&id).is_some())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_reviews_for(&self, product_ids: &[ProductId]) -> Result<Vec<Review>> {
        let rows = self
            .reviews
            .iter()
            .filter(|e| product_ids.contains(&e.doc.product_id))
            .map(|e| (e.seq, e.doc.clone()))
            .collect();
        Ok(sorted(rows))
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.reviews.get(&id).map(|e| e.doc.clone()))
    }

    async fn insert_review(&self, review: Review) -> Result<()> {
        let seq = self.next_seq();
        self.reviews.insert(review.id, Stored { seq, doc: review });
        Ok(())
    }

    async fn update_review(&self, review: Review) -> Result<()> {
        match self.reviews.get_mut(&review.id) {
            Some(mut entry) => {
                entry.doc = review;
                Ok(())
            }
            None => Err(DomainError::not_found("review")),
        }
    }

    async fn delete_review(&self, id: ReviewId) -> Result<()> {
        self.reviews.remove(&id);
        Ok(())
    }
}
