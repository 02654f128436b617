//! # ProductCatalog
//!
//! Owner-scoped CRUD over products. Existence and ownership are always
//! checked before anything is written, including the image file.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, MediaStorage, NewProduct, Product, ProductId, ProductPatch, ProductRepository,
    ProductWithReviews, Result, ReviewRepository, Upload, UserId,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::aggregation::attach_reviews;
use crate::authz;

pub struct ProductCatalog {
    products: Arc<dyn ProductRepository>,
    reviews: Arc<dyn ReviewRepository>,
    media: Arc<dyn MediaStorage>,
}

impl ProductCatalog {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        reviews: Arc<dyn ReviewRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            products,
            reviews,
            media,
        }
    }

    /// Every product with its reviews attached. Unpaginated.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductWithReviews>> {
        let products = self.products.list_products().await?;
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let reviews = if ids.is_empty() {
            Vec::new()
        } else {
            self.reviews.list_reviews_for(&ids).await?
        };
        Ok(attach_reviews(products, reviews))
    }

    #[instrument(skip(self, input), fields(owner = %caller))]
    pub async fn create_product(&self, caller: UserId, input: NewProduct) -> Result<Product> {
        let name = required_name(input.name.as_deref())?;
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();

        // The file must be durable before any record points at it.
        let image_path = match input.image {
            Some(upload) => self.store_image(upload).await?,
            None => String::new(),
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            owner_id: caller,
            name,
            description,
            image_path,
            created_at: now,
            updated_at: now,
        };
        self.products.insert_product(product.clone()).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self, patch), fields(caller = %caller))]
    pub async fn update_product(
        &self,
        caller: UserId,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product> {
        let mut product = self.owned_product(caller, product_id).await?;

        let name = patch.name.as_deref().map(|n| required_name(Some(n))).transpose()?;

        let mut changed = false;
        if let Some(name) = name {
            changed |= replace(&mut product.name, name);
        }
        if let Some(description) = patch.description {
            changed |= replace(&mut product.description, description.trim().to_owned());
        }
        if let Some(upload) = patch.image {
            // The previous file is left in place.
            let path = self.store_image(upload).await?;
            changed |= replace(&mut product.image_path, path);
        }

        if changed {
            product.updated_at = Utc::now();
            self.products.update_product(product.clone()).await?;
            info!(product_id = %product.id, "product updated");
        }
        Ok(product)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn delete_product(&self, caller: UserId, product_id: ProductId) -> Result<()> {
        self.owned_product(caller, product_id).await?;

        if !self.products.delete_product_cascade(product_id).await? {
            // Lost a race with another delete.
            return Err(DomainError::not_found("product"));
        }
        info!(%product_id, "product and its reviews deleted");
        Ok(())
    }

    /// Loads the product if `caller` may modify it: `NotFound` when it does
    /// not exist, `Forbidden` for anyone but the owner.
    pub async fn owned_product(&self, caller: UserId, product_id: ProductId) -> Result<Product> {
        let product = self
            .products
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;
        authz::ensure_owner(caller, &product)?;
        Ok(product)
    }

    async fn store_image(&self, upload: Upload) -> Result<String> {
        self.media.store(upload).await
    }
}

fn required_name(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_owned()),
        _ => Err(DomainError::validation("name is required")),
    }
}

/// Assigns `value` and reports whether anything changed.
fn replace(slot: &mut String, value: String) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
