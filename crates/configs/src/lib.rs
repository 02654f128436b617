//! # configs
//!
//! Layered settings: built-in defaults, then `config/default.toml`, then
//! `config/local.toml`, then `CATALOG__SECTION__KEY` environment variables,
//! then the conventional plain variables (`DATABASE_URL`, `JWT_SECRET`,
//! `PORT`, `ALLOWED_ORIGIN`). A `.env` file is read first if present.
//!
//! [`Settings`] is what the server needs; [`ToolSettings`] is the subset for
//! offline tools such as the seeder.

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Single origin allowed by CORS (the frontend)
    pub allowed_origin: String,
    /// Upper bound for request bodies, multipart uploads included
    pub body_limit_bytes: usize,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub upload_dir: PathBuf,
    /// Public path the upload directory is served under
    pub url_prefix: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Loads `.env`, then every configuration layer.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(layered()?)
    }

    /// Built-in defaults. Secrets deliberately have none.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000_i64)?
            .set_default("server.allowed_origin", "http://localhost:5173")?
            .set_default("server.body_limit_bytes", 5_i64 * 1024 * 1024)?
            .set_default("database.max_connections", 10_i64)?
            .set_default("auth.token_ttl_secs", 3600_i64)?
            .set_default("media.upload_dir", "./uploads")?
            .set_default("media.url_prefix", "/uploads")?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info")?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("media.url_prefix must start with '/'".into()));
        }
        self.database.validate()
    }
}

impl DatabaseSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }
}

/// The subset offline tools need: database access and logging. Loaded from
/// the same layers as [`Settings`], but without requiring auth secrets.
#[derive(Debug, Deserialize)]
pub struct ToolSettings {
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

impl ToolSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(layered()?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: ToolSettings = builder.build()?.try_deserialize()?;
        settings.database.validate()?;
        Ok(settings)
    }
}

/// Defaults, config files, `CATALOG__*` variables, then the plain overrides.
fn layered() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }

    Ok(Settings::defaults()?
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
        .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
        .set_override_option("server.port", std::env::var("PORT").ok())?
        .set_override_option("server.allowed_origin", std::env::var("ALLOWED_ORIGIN").ok())?)
}
