//! Read-time join of products and their reviews.

use std::collections::HashMap;

use domains::{Product, ProductId, ProductWithReviews, Review};

/// Groups `reviews` under their product.
///
/// Every product appears once, in input order, with an empty list when it has
/// no reviews. Reviews keep their input order inside a group; reviews whose
/// product is not in `products` are dropped.
pub fn attach_reviews(products: Vec<Product>, reviews: Vec<Review>) -> Vec<ProductWithReviews> {
    let mut by_product: HashMap<ProductId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_product.entry(review.product_id).or_default().push(review);
    }

    products
        .into_iter()
        .map(|product| {
            let reviews = by_product.remove(&product.id).unwrap_or_default();
            ProductWithReviews { product, reviews }
        })
        .collect()
}
