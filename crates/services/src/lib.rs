//! # services
//!
//! Business logic of the catalog, written purely against the `domains` ports:
//! credentials, the product catalog, the review ledger and the aggregation
//! view that joins them for listing.

pub mod aggregation;
pub mod authz;
pub mod credentials;
pub mod products;
pub mod reviews;

pub use aggregation::attach_reviews;
pub use authz::bearer_token;
pub use credentials::CredentialService;
pub use products::ProductCatalog;
pub use reviews::ReviewLedger;
