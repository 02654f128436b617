//! # LocalMediaStorage
//!
//! Local filesystem implementation of `MediaStorage`.
//! Content-addressable: the file name is the SHA-256 of the bytes, sharded
//! into a sub-directory by its first two hex characters. Identical uploads
//! share one file.

use std::path::PathBuf;

use async_trait::async_trait;
use domains::{DomainError, MediaStorage, Result, Upload};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use uuid::Uuid;

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g. "./uploads")
    root_path: PathBuf,
    /// Public URL prefix the root is served under (e.g. "/uploads")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_owned();
        Self {
            root_path: root.into(),
            url_prefix,
        }
    }
}

fn io_err(err: std::io::Error) -> DomainError {
    error!(error = %err, "upload write failed");
    DomainError::internal("could not store upload")
}

/// Only real images are accepted: the declared type must be `image/*` and the
/// bytes must sniff as a known format. Returns the canonical file extension.
fn image_extension(upload: &Upload) -> Result<&'static str> {
    if upload.content_type.type_() != mime::IMAGE {
        return Err(DomainError::validation("only image uploads are accepted"));
    }
    let format = image::guess_format(&upload.data)
        .map_err(|_| DomainError::validation("unrecognized image format"))?;
    Ok(format.extensions_str().first().copied().unwrap_or("img"))
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, upload: Upload) -> Result<String> {
        let ext = image_extension(&upload)?;

        let hash = hex::encode(Sha256::digest(&upload.data));
        let shard = &hash[..2];
        let file_name = format!("{hash}.{ext}");
        let public_path = format!("{}/{shard}/{file_name}", self.url_prefix);

        let dir = self.root_path.join(shard);
        let target = dir.join(&file_name);
        if fs::try_exists(&target).await.map_err(io_err)? {
            debug!(%public_path, "upload already stored");
            return Ok(public_path);
        }

        fs::create_dir_all(&dir).await.map_err(io_err)?;

        // Write-then-rename: the target only ever appears complete and synced.
        let tmp = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&upload.data).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &target).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(err));
        }

        debug!(%public_path, bytes = upload.data.len(), "upload stored");
        Ok(public_path)
    }
}
