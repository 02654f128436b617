//! # ReviewLedger
//!
//! Star reviews attached to products, mutable only by their author.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, LenientInt, NewReview, Patch, ProductId, ProductRepository, Rating, Result,
    Review, ReviewId, ReviewPatch, ReviewRepository, UserId,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz;

pub struct ReviewLedger {
    products: Arc<dyn ProductRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewLedger {
    pub fn new(products: Arc<dyn ProductRepository>, reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { products, reviews }
    }

    #[instrument(skip(self, input), fields(caller = %caller))]
    pub async fn add_review(
        &self,
        caller: UserId,
        product_id: ProductId,
        input: NewReview,
    ) -> Result<Review> {
        let rating = rating(input.rating)?;
        let text = required_text(input.text.as_deref())?;
        let author_name = input
            .author_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();

        if self.products.get_product(product_id).await?.is_none() {
            return Err(DomainError::not_found("product"));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::now_v7(),
            product_id,
            user_id: caller,
            rating,
            text,
            author_name,
            created_at: now,
            updated_at: now,
        };
        self.reviews.insert_review(review.clone()).await?;
        info!(review_id = %review.id, %product_id, "review added");
        Ok(review)
    }

    #[instrument(skip(self, patch), fields(caller = %caller))]
    pub async fn update_review(
        &self,
        caller: UserId,
        product_id: ProductId,
        review_id: ReviewId,
        patch: ReviewPatch,
    ) -> Result<Review> {
        let mut review = self.authored_review(caller, product_id, review_id).await?;

        let rating = match patch.rating {
            Patch::Absent => None,
            Patch::Null => return Err(DomainError::validation("rating cannot be null")),
            Patch::Value(value) => Some(self::rating(Some(value))?),
        };
        let text = match patch.text {
            Patch::Absent => None,
            Patch::Null => return Err(DomainError::validation("text cannot be null")),
            Patch::Value(value) => Some(required_text(Some(&value))?),
        };
        let author_name = match patch.author_name {
            Patch::Absent => None,
            Patch::Null => Some(String::new()),
            Patch::Value(value) => Some(value.trim().to_owned()),
        };

        if rating.is_none() && text.is_none() && author_name.is_none() {
            return Ok(review);
        }
        if let Some(rating) = rating {
            review.rating = rating;
        }
        if let Some(text) = text {
            review.text = text;
        }
        if let Some(author_name) = author_name {
            review.author_name = author_name;
        }
        review.updated_at = Utc::now();

        self.reviews.update_review(review.clone()).await?;
        info!(%review_id, "review updated");
        Ok(review)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn delete_review(
        &self,
        caller: UserId,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<()> {
        self.authored_review(caller, product_id, review_id).await?;
        self.reviews.delete_review(review_id).await?;
        info!(%review_id, "review deleted");
        Ok(())
    }

    /// Loads the review, rejecting a product mismatch as not-found and a
    /// foreign author as forbidden.
    async fn authored_review(
        &self,
        caller: UserId,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<Review> {
        let review = self
            .reviews
            .get_review(review_id)
            .await?
            .filter(|r| r.product_id == product_id)
            .ok_or_else(|| DomainError::not_found("review"))?;
        authz::ensure_owner(caller, &review)?;
        Ok(review)
    }
}

fn rating(raw: Option<LenientInt>) -> Result<Rating> {
    match raw {
        Some(LenientInt(value)) => Rating::new(value),
        None => Err(DomainError::validation("rating is required")),
    }
}

fn required_text(text: Option<&str>) -> Result<String> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_owned()),
        _ => Err(DomainError::validation("text is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockProductRepository, MockReviewRepository, Product};

    fn some_product(id: ProductId) -> Product {
        let now = Utc::now();
        Product {
            id,
            owner_id: Uuid::now_v7(),
            name: "Chair".into(),
            description: String::new(),
            image_path: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn stored_review(product_id: ProductId, author: UserId) -> Review {
        let created = Utc::now() - chrono::Duration::minutes(1);
        Review {
            id: Uuid::now_v7(),
            product_id,
            user_id: author,
            rating: Rating::new(3).unwrap(),
            text: "Fine".into(),
            author_name: "Kim".into(),
            created_at: created,
            updated_at: created,
        }
    }

    fn products_with(id: ProductId) -> MockProductRepository {
        let mut products = MockProductRepository::new();
        products
            .expect_get_product()
            .returning(move |pid| Ok((pid == id).then(|| some_product(id))));
        products
    }

    fn reviews_holding(review: Review) -> MockReviewRepository {
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_get_review()
            .returning(move |rid| Ok((rid == review.id).then(|| review.clone())));
        reviews
    }

    fn new_review(rating: i64, text: &str) -> NewReview {
        NewReview {
            rating: Some(LenientInt(rating)),
            text: Some(text.into()),
            author_name: None,
        }
    }

    #[tokio::test]
    async fn rating_bounds_are_enforced() {
        let pid = Uuid::now_v7();
        let mut reviews = MockReviewRepository::new();
        reviews.expect_insert_review().times(2).returning(|_| Ok(()));
        let ledger = ReviewLedger::new(Arc::new(products_with(pid)), Arc::new(reviews));
        let caller = Uuid::now_v7();

        for bad in [0, 6] {
            assert!(matches!(
                ledger.add_review(caller, pid, new_review(bad, "x")).await,
                Err(DomainError::Validation(_))
            ));
        }
        for good in [1, 5] {
            let review = ledger.add_review(caller, pid, new_review(good, "x")).await.unwrap();
            assert_eq!(i64::from(review.rating), good);
        }
    }

    #[tokio::test]
    async fn add_review_requires_text_and_existing_product() {
        let pid = Uuid::now_v7();
        let mut reviews = MockReviewRepository::new();
        reviews.expect_insert_review().never();
        let ledger = ReviewLedger::new(Arc::new(products_with(pid)), Arc::new(reviews));

        assert!(matches!(
            ledger.add_review(Uuid::now_v7(), pid, new_review(4, "  ")).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            ledger
                .add_review(Uuid::now_v7(), Uuid::now_v7(), new_review(4, "ok"))
                .await,
            Err(DomainError::not_found("product"))
        );
    }

    #[tokio::test]
    async fn author_is_the_caller_not_the_label() {
        let pid = Uuid::now_v7();
        let caller = Uuid::now_v7();
        let mut reviews = MockReviewRepository::new();
        reviews.expect_insert_review().returning(|_| Ok(()));
        let ledger = ReviewLedger::new(Arc::new(products_with(pid)), Arc::new(reviews));

        let review = ledger
            .add_review(
                caller,
                pid,
                NewReview {
                    author_name: Some(" someone else ".into()),
                    ..new_review(5, "Great")
                },
            )
            .await
            .unwrap();
        assert_eq!(review.user_id, caller);
        assert_eq!(review.author_name, "someone else");
    }

    #[tokio::test]
    async fn update_with_mismatched_product_is_not_found() {
        let author = Uuid::now_v7();
        let stored = stored_review(Uuid::now_v7(), author);
        let rid = stored.id;
        let mut reviews = reviews_holding(stored);
        reviews.expect_update_review().never();
        let ledger = ReviewLedger::new(Arc::new(MockProductRepository::new()), Arc::new(reviews));

        let err = ledger
            .update_review(author, Uuid::now_v7(), rid, ReviewPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("review"));
    }

    #[tokio::test]
    async fn update_by_other_user_is_forbidden() {
        let stored = stored_review(Uuid::now_v7(), Uuid::now_v7());
        let (pid, rid) = (stored.product_id, stored.id);
        let mut reviews = reviews_holding(stored);
        reviews.expect_update_review().never();
        let ledger = ReviewLedger::new(Arc::new(MockProductRepository::new()), Arc::new(reviews));

        let err = ledger
            .update_review(
                Uuid::now_v7(),
                pid,
                rid,
                ReviewPatch {
                    rating: Patch::Value(LenientInt(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let author = Uuid::now_v7();
        let stored = stored_review(Uuid::now_v7(), author);
        let before = stored.clone();
        let mut reviews = reviews_holding(stored);
        reviews
            .expect_update_review()
            .withf(|r| r.rating.value() == 5 && r.text == "Fine" && r.author_name.is_empty())
            .times(1)
            .returning(|_| Ok(()));
        let ledger = ReviewLedger::new(Arc::new(MockProductRepository::new()), Arc::new(reviews));

        let after = ledger
            .update_review(
                author,
                before.product_id,
                before.id,
                ReviewPatch {
                    rating: Patch::Value(LenientInt(5)),
                    author_name: Patch::Null,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after.text, before.text);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_null_text_and_bad_rating() {
        let author = Uuid::now_v7();
        let stored = stored_review(Uuid::now_v7(), author);
        let (pid, rid) = (stored.product_id, stored.id);
        let mut reviews = reviews_holding(stored);
        reviews.expect_update_review().never();
        let ledger = ReviewLedger::new(Arc::new(MockProductRepository::new()), Arc::new(reviews));

        for patch in [
            ReviewPatch { text: Patch::Null, ..Default::default() },
            ReviewPatch { rating: Patch::Value(LenientInt(7)), ..Default::default() },
            ReviewPatch { rating: Patch::Null, ..Default::default() },
        ] {
            assert!(matches!(
                ledger.update_review(author, pid, rid, patch).await,
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn delete_requires_author() {
        let author = Uuid::now_v7();
        let stored = stored_review(Uuid::now_v7(), author);
        let (pid, rid) = (stored.product_id, stored.id);
        let mut reviews = reviews_holding(stored);
        reviews
            .expect_delete_review()
            .withf(move |id| *id == rid)
            .times(1)
            .returning(|_| Ok(()));
        let ledger = ReviewLedger::new(Arc::new(MockProductRepository::new()), Arc::new(reviews));

        assert!(matches!(
            ledger.delete_review(Uuid::now_v7(), pid, rid).await,
            Err(DomainError::Forbidden(_))
        ));
        ledger.delete_review(author, pid, rid).await.unwrap();
        assert_eq!(
            ledger.delete_review(author, pid, Uuid::now_v7()).await,
            Err(DomainError::not_found("review"))
        );
    }
}
