//! # Catalog Server
//!
//! The entry point that assembles the application from its adapters:
//! Postgres persistence, argon2 + JWT credentials, local image storage and
//! the axum HTTP layer.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, ApiConfig, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenIssuer};
use configs::{LogFormat, LogSettings, Settings};
use secrecy::ExposeSecret;
use services::{CredentialService, ProductCatalog, ReviewLedger};
use storage_adapters::{LocalMediaStorage, PgStore};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    // 1. Persistence
    let store = Arc::new(
        PgStore::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await
        .context("connecting to database")?,
    );
    store.migrate().await.context("running migrations")?;

    // 2. Media
    tokio::fs::create_dir_all(&settings.media.upload_dir)
        .await
        .with_context(|| format!("creating {}", settings.media.upload_dir.display()))?;
    let media = Arc::new(LocalMediaStorage::new(
        settings.media.upload_dir.clone(),
        settings.media.url_prefix.clone(),
    ));

    // 3. Credentials
    let tokens = Arc::new(JwtTokenIssuer::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        chrono::Duration::seconds(settings.auth.token_ttl_secs),
    ));
    let hasher = Arc::new(Argon2Hasher::new());

    // 4. Services, wired through the ports
    let state = AppState {
        credentials: Arc::new(CredentialService::new(store.clone(), hasher, tokens)),
        catalog: Arc::new(ProductCatalog::new(store.clone(), store.clone(), media)),
        reviews: Arc::new(ReviewLedger::new(store.clone(), store)),
    };

    let api_config = ApiConfig {
        allowed_origin: settings.server.allowed_origin.clone(),
        body_limit_bytes: settings.server.body_limit_bytes,
        upload_dir: settings.media.upload_dir.clone(),
        url_prefix: settings.media.url_prefix.clone(),
    };
    let app = router(state, &api_config);

    let address = settings.server.bind_addr();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, origin = %api_config.allowed_origin, "catalog server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("server shut down");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
