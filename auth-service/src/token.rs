//! Access/refresh token issuance and verification.
//!
//! Both token kinds are HS256 JWTs carrying the same claim shape (`sub`, `unm`, `exp`); only
//! their TTL differs. A refresh token is therefore just a JWT with a longer expiry, not an
//! opaque string backed by its own table (see DESIGN.md's Open Question decision on this).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    unm: String,
    exp: i64,
}

pub struct TokenManager {
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
    signing_key: String,
}

impl TokenManager {
    pub fn new(access_ttl_secs: i64, refresh_ttl_secs: i64, signing_key: String) -> Self {
        Self {
            access_ttl: chrono::Duration::seconds(access_ttl_secs),
            refresh_ttl: chrono::Duration::seconds(refresh_ttl_secs),
            signing_key,
        }
    }

    pub fn create_tokens(&self, user_id: i64, user_name: &str) -> Result<(String, String), TokenError> {
        let access = self.new_jwt(user_id, user_name, self.access_ttl)?;
        let refresh = self.new_jwt(user_id, user_name, self.refresh_ttl)?;
        Ok((access, refresh))
    }

    /// Recover `(user_id, user_name)` from a signed token, rejecting an expired or malformed one.
    pub fn parse(&self, token: &str) -> Result<(i64, String), TokenError> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        let key = DecodingKey::from_secret(self.signing_key.as_bytes());

        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => Ok((data.claims.sub, data.claims.unm)),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid(e.to_string())),
            },
        }
    }

    fn new_jwt(&self, user_id: i64, user_name: &str, ttl: chrono::Duration) -> Result<String, TokenError> {
        let exp = (chrono::Utc::now() + ttl).timestamp();
        let claims = Claims {
            sub: user_id,
            unm: user_name.to_string(),
            exp,
        };
        encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.signing_key.as_bytes()),
        )
        .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TokenManager {
        TokenManager::new(900, 604_800, "test-secret".to_string())
    }

    #[test]
    fn round_trips_claims() {
        let tm = manager();
        let (access, refresh) = tm.create_tokens(42, "alice").unwrap();

        let (uid, name) = tm.parse(&access).unwrap();
        assert_eq!(uid, 42);
        assert_eq!(name, "alice");

        let (uid, name) = tm.parse(&refresh).unwrap();
        assert_eq!(uid, 42);
        assert_eq!(name, "alice");
    }

    #[test]
    fn rejects_expired_token() {
        let tm = TokenManager::new(-1, 604_800, "test-secret".to_string());
        let (access, _) = tm.create_tokens(7, "bob").unwrap();
        let err = tm.parse(&access).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn rejects_token_signed_with_other_key() {
        let tm_a = manager();
        let tm_b = TokenManager::new(900, 604_800, "other-secret".to_string());
        let (access, _) = tm_a.create_tokens(1, "carol").unwrap();
        let err = tm_b.parse(&access).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
