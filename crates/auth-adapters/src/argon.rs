//! Argon2id implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use domains::{DomainError, PasswordHasher, Result};
use rand_core::OsRng;
use tracing::{error, warn};

#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom cost, e.g. cheaper parameters for test suites.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| DomainError::internal(format!("argon2 params: {e}")))?;
        Ok(Self { params })
    }

    fn argon(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn join_err(err: tokio::task::JoinError) -> DomainError {
    error!(error = %err, "password hashing task failed");
    DomainError::internal("password hashing failed")
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String> {
        let argon = self.argon();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon
                .hash_password(password.as_bytes(), &salt)
                .map(|digest| digest.to_string())
                .map_err(|e| DomainError::internal(format!("argon2: {e}")))
        })
        .await
        .map_err(join_err)?
    }

    async fn verify(&self, password: &str, digest: &str) -> Result<bool> {
        let argon = self.argon();
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&digest) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "stored password digest is unparseable");
                    return false;
                }
            };
            argon.verify_password(password.as_bytes(), &parsed).is_ok()
        })
        .await
        .map_err(join_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Hasher {
        Argon2Hasher::with_cost(1024, 1).unwrap()
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = cheap();
        let digest = hasher.hash("pw123456").await.unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("pw123456"));
        assert!(hasher.verify("pw123456", &digest).await.unwrap());
        assert!(!hasher.verify("pw1234567", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_per_hash() {
        let hasher = cheap();
        let a = hasher.hash("same").await.unwrap();
        let b = hasher.hash("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_digest_never_verifies() {
        assert!(!cheap().verify("pw", "not-a-phc-string").await.unwrap());
    }
}
