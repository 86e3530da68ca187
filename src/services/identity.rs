use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::OwnerId,
};

/// Resolves request credentials to a stable owner
///
/// Implementations never say why a credential was rejected; every failure is
/// simply the absence of an owner.
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<OwnerId>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 session tokens wrapped around the external credential service
///
/// Once the credential service has vouched for a user, `issue` mints a
/// token carrying their id; `resolve` accepts it until it expires.
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Mints a session token for an already authenticated owner
    pub fn issue(&self, owner: &OwnerId) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: owner.as_str().to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }
}

#[async_trait::async_trait]
impl IdentityResolver for SessionTokens {
    async fn resolve(&self, token: &str) -> Option<OwnerId> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(OwnerId(data.claims.sub)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let tokens = SessionTokens::new("s3cret", 60);
        let token = tokens.issue(&OwnerId::new("user-17")).unwrap();
        assert_eq!(tokens.resolve(&token).await, Some(OwnerId::new("user-17")));
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let ours = SessionTokens::new("s3cret", 60);
        let theirs = SessionTokens::new("other", 60);
        let token = theirs.issue(&OwnerId::new("user-17")).unwrap();
        assert_eq!(ours.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let tokens = SessionTokens::new("s3cret", 60);
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "user-17".into(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        assert_eq!(tokens.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn test_garbage_rejected() {
        let tokens = SessionTokens::new("s3cret", 60);
        assert_eq!(tokens.resolve("").await, None);
        assert_eq!(tokens.resolve("not.a.token").await, None);
    }
}
