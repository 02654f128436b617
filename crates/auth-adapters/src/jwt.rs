//! HS256 JSON Web Tokens implementing the `TokenIssuer` port.

use chrono::{Duration, Utc};
use domains::{DomainError, Result, TokenIssuer, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user id
    sub: UserId,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is the only revocation mechanism; no grace period.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user_id: UserId) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "token signing failed");
            DomainError::internal("could not issue token")
        })
    }

    fn verify(&self, token: &str) -> Result<UserId> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                DomainError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn issued_token_round_trips_subject() {
        let issuer = JwtTokenIssuer::new(b"secret", Duration::hours(1));
        let user = Uuid::now_v7();
        let token = issuer.issue(user).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), user);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = JwtTokenIssuer::new(b"secret", Duration::seconds(-30));
        let token = issuer.issue(Uuid::now_v7()).unwrap();
        assert_eq!(issuer.verify(&token), Err(DomainError::InvalidToken));
    }

    #[test]
    fn foreign_signature_and_garbage_are_rejected() {
        let ours = JwtTokenIssuer::new(b"secret", Duration::hours(1));
        let theirs = JwtTokenIssuer::new(b"other", Duration::hours(1));
        let token = theirs.issue(Uuid::now_v7()).unwrap();

        assert_eq!(ours.verify(&token), Err(DomainError::InvalidToken));
        assert_eq!(ours.verify("not.a.jwt"), Err(DomainError::InvalidToken));
    }
}
