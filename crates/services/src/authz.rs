//! Ownership checks shared by every guarded operation.
//!
//! The caller id is always an explicit argument; nothing here reads request
//! state.

use domains::{DomainError, Owned, Result, UserId};

/// Fails with `Forbidden` unless `caller` owns `resource`.
pub fn ensure_owner(caller: UserId, resource: &dyn Owned) -> Result<()> {
    if resource.owner_id() == caller {
        return Ok(());
    }
    Err(DomainError::Forbidden(format!(
        "only the owner may modify this {}",
        resource.kind()
    )))
}

/// Pulls the credential out of an `Authorization` header value.
///
/// Returns `None` when the header is absent, uses another scheme, or carries
/// an empty token.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::Product;
    use uuid::Uuid;

    fn product_owned_by(owner: UserId) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            owner_id: owner,
            name: "Lamp".into(),
            description: String::new(),
            image_path: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ownership_requires_matching_id() {
        let owner = Uuid::now_v7();
        let product = product_owned_by(owner);
        assert!(ensure_owner(owner, &product).is_ok());
        assert!(matches!(
            ensure_owner(Uuid::now_v7(), &product),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("bearer   abc ")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("abc")), None);
        assert_eq!(bearer_token(None), None);
    }
}
