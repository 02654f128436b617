//! # seed
//!
//! Replaces the catalog with the products listed in a JSON file.
//!
//! ```sh
//! seed [path/to/products.json]
//! ```
//!
//! Products need an owner, so a seed account is created on first run from
//! `SEED_OWNER_EMAIL` / `SEED_OWNER_PASSWORD`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use auth_adapters::Argon2Hasher;
use chrono::Utc;
use configs::ToolSettings;
use domains::{
    normalize_email, PasswordHasher, Product, ProductRepository, User, UserId, UserRepository,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use storage_adapters::PgStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_DATA: &str = "cmd/seed/data/products.seed.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = ToolSettings::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA));
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let seeds: Vec<SeedProduct> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to database")?;
    store.migrate().await?;

    let owner = seed_owner(&store).await?;

    let removed = store.clear_catalog().await?;
    info!(removed, "catalog cleared");

    let mut inserted = 0usize;
    for seed in seeds {
        let name = seed.name.trim();
        if name.is_empty() {
            warn!("skipping seed entry without a name");
            continue;
        }
        let now = Utc::now();
        store
            .insert_product(Product {
                id: Uuid::now_v7(),
                owner_id: owner,
                name: name.to_owned(),
                description: seed.description.trim().to_owned(),
                image_path: seed.image_path.trim().to_owned(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        inserted += 1;
    }

    info!(inserted, source = %path.display(), "seed complete");
    Ok(())
}

/// Finds the seed account, creating it if needed.
async fn seed_owner(store: &PgStore) -> anyhow::Result<UserId> {
    let email = normalize_email(
        &std::env::var("SEED_OWNER_EMAIL").unwrap_or_else(|_| "seed@catalog.local".into()),
    );

    if let Some(user) = store.find_user_by_email(&email).await? {
        return Ok(user.id);
    }

    let Ok(password) = std::env::var("SEED_OWNER_PASSWORD") else {
        bail!("SEED_OWNER_PASSWORD must be set to create the seed account {email}");
    };
    if password.is_empty() {
        bail!("SEED_OWNER_PASSWORD must not be empty");
    }

    let user = User {
        id: Uuid::now_v7(),
        email,
        password_hash: Argon2Hasher::new().hash(&password).await?,
        created_at: Utc::now(),
    };
    let id = user.id;
    store.insert_user(user).await?;
    info!(user_id = %id, "seed owner created");
    Ok(id)
}
