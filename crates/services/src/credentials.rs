//! # CredentialService
//!
//! Registration, login and bearer-token validation.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use domains::{
    normalize_email, AuthResponse, Credentials, DomainError, PasswordHasher, PublicUser,
    Result, TokenIssuer, User, UserId, UserRepository,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "invalid credentials";
const DUMMY_PASSWORD: &str = "catalog-timing-equalizer";

pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    /// Digest verified against when the email is unknown, so both login
    /// failure paths do the same amount of work.
    dummy_digest: OnceLock<String>,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            dummy_digest: OnceLock::new(),
        }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, credentials: Credentials) -> Result<AuthResponse> {
        let (email, password) = required(credentials)?;

        let user = User {
            id: Uuid::now_v7(),
            email,
            password_hash: self.hasher.hash(&password).await?,
            created_at: Utc::now(),
        };
        self.users.insert_user(user.clone()).await?;
        info!(user_id = %user.id, "user registered");

        self.respond(&user)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse> {
        let (email, password) = required(credentials)?;

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            // Burn the same verify cost as a real account before failing.
            let digest = self.dummy_digest().await?;
            let _ = self.hasher.verify(&password, &digest).await?;
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };

        if !self.hasher.verify(&password, &user.password_hash).await? {
            warn!(user_id = %user.id, "login rejected");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }

        self.respond(&user)
    }

    /// Resolves a bearer token to the caller id. `None` means no token was
    /// presented at all.
    pub fn verify_token(&self, token: Option<&str>) -> Result<UserId> {
        let token = token.ok_or_else(|| DomainError::Unauthenticated("token missing".into()))?;
        self.tokens.verify(token)
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self, caller: UserId) -> Result<PublicUser> {
        self.users
            .find_user_by_id(caller)
            .await?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| DomainError::not_found("user"))
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue(user.id)?,
            user: PublicUser::from(user),
        })
    }

    async fn dummy_digest(&self) -> Result<String> {
        if let Some(digest) = self.dummy_digest.get() {
            return Ok(digest.clone());
        }
        let digest = self.hasher.hash(DUMMY_PASSWORD).await?;
        Ok(self.dummy_digest.get_or_init(|| digest).clone())
    }
}

/// Normalized email and raw password, or a validation error if either is
/// missing or blank.
fn required(credentials: Credentials) -> Result<(String, String)> {
    let email = credentials
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let password = credentials.password.filter(|p| !p.is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(DomainError::validation("email and password required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockPasswordHasher, MockTokenIssuer, MockUserRepository};
    use mockall::predicate::eq;

    fn token_issuer() -> MockTokenIssuer {
        let mut tokens = MockTokenIssuer::new();
        tokens.expect_issue().returning(|id| Ok(format!("token-{id}")));
        tokens
    }

    fn stored_user(email: &str) -> User {
        User {
            id: Uuid::now_v7(),
            email: email.into(),
            password_hash: "digest:pw123456".into(),
            created_at: Utc::now(),
        }
    }

    fn plain_hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|pw| Ok(format!("digest:{pw}")));
        hasher
            .expect_verify()
            .returning(|pw, digest| Ok(digest == format!("digest:{pw}")));
        hasher
    }

    fn service(users: MockUserRepository, hasher: MockPasswordHasher, tokens: MockTokenIssuer) -> CredentialService {
        CredentialService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens))
    }

    #[tokio::test]
    async fn register_normalizes_email_and_stores_digest_only() {
        let mut users = MockUserRepository::new();
        users
            .expect_insert_user()
            .withf(|u| u.email == "a@x.com" && u.password_hash == "digest:pw123456")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(users, plain_hasher(), token_issuer());
        let out = svc
            .register(Credentials::new("  A@X.com ", "pw123456"))
            .await
            .unwrap();

        assert_eq!(out.user.email, "a@x.com");
        assert_eq!(out.token, format!("token-{}", out.user.id));
    }

    #[tokio::test]
    async fn register_requires_both_fields() {
        let svc = service(MockUserRepository::new(), MockPasswordHasher::new(), MockTokenIssuer::new());

        for creds in [
            Credentials { email: None, password: Some("pw".into()) },
            Credentials { email: Some("   ".into()), password: Some("pw".into()) },
            Credentials { email: Some("a@x.com".into()), password: Some(String::new()) },
        ] {
            assert!(matches!(
                svc.register(creds).await,
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn register_propagates_conflict() {
        let mut users = MockUserRepository::new();
        users
            .expect_insert_user()
            .returning(|_| Err(DomainError::Conflict("email already in use".into())));

        let svc = service(users, plain_hasher(), MockTokenIssuer::new());
        let err = svc
            .register(Credentials::new("a@x.com", "pw123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_unknown_email_and_wrong_password_look_identical() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_email()
            .with(eq("a@x.com"))
            .returning(|email| Ok(Some(stored_user(email))));
        users
            .expect_find_user_by_email()
            .with(eq("nobody@x.com"))
            .returning(|_| Ok(None));

        let svc = service(users, plain_hasher(), token_issuer());

        let wrong = svc
            .login(Credentials::new("a@x.com", "nope"))
            .await
            .unwrap_err();
        let unknown = svc
            .login(Credentials::new("nobody@x.com", "pw123456"))
            .await
            .unwrap_err();

        assert_eq!(wrong, unknown);
        assert_eq!(wrong, DomainError::Unauthenticated(INVALID_CREDENTIALS.into()));
    }

    #[tokio::test]
    async fn login_succeeds_with_normalized_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_email()
            .with(eq("a@x.com"))
            .returning(|email| Ok(Some(stored_user(email))));

        let svc = service(users, plain_hasher(), token_issuer());
        let out = svc
            .login(Credentials::new(" A@x.COM", "pw123456"))
            .await
            .unwrap();
        assert_eq!(out.user.email, "a@x.com");
    }

    #[test]
    fn verify_token_distinguishes_missing_from_invalid() {
        let mut tokens = MockTokenIssuer::new();
        tokens
            .expect_verify()
            .returning(|_| Err(DomainError::InvalidToken));
        let svc = service(MockUserRepository::new(), MockPasswordHasher::new(), tokens);

        assert!(matches!(svc.verify_token(None), Err(DomainError::Unauthenticated(_))));
        assert_eq!(svc.verify_token(Some("garbage")), Err(DomainError::InvalidToken));
    }

    #[tokio::test]
    async fn current_user_missing_subject_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_user_by_id().returning(|_| Ok(None));
        let svc = service(users, MockPasswordHasher::new(), MockTokenIssuer::new());

        assert_eq!(
            svc.current_user(Uuid::now_v7()).await,
            Err(DomainError::not_found("user"))
        );
    }
}
