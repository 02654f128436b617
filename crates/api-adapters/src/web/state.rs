use std::path::PathBuf;
use std::sync::Arc;

use services::{CredentialService, ProductCatalog, ReviewLedger};

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub catalog: Arc<ProductCatalog>,
    pub reviews: Arc<ReviewLedger>,
}

/// HTTP-layer settings, mapped from the binary's configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin allowed by CORS
    pub allowed_origin: String,
    /// Request body cap, multipart uploads included
    pub body_limit_bytes: usize,
    /// Directory served statically under `url_prefix`
    pub upload_dir: PathBuf,
    pub url_prefix: String,
}
