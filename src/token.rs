use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{ApiError, ApiResult};
use crate::models::Claims;

/// Longest token lifetime accepted from configuration (ten years).
pub const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

/// Issues and checks the HS256 bearer tokens handed out at signup and login.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        TokenIssuer {
            secret,
            ttl: chrono::Duration::hours(ttl_hours.clamp(-MAX_TTL_HOURS, MAX_TTL_HOURS)),
        }
    }

    pub fn issue(&self, user_id: &str) -> ApiResult<String> {
        let expiration = chrono::Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Token("expiration out of range".to_string()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| ApiError::Token(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_names_the_user() {
        let issuer = TokenIssuer::new("secret_ecomm".to_string(), 1);
        let token = issuer.issue("user-42").unwrap();
        assert_eq!(issuer.verify(&token).unwrap().sub, "user-42");
    }

    #[test]
    fn other_secret_rejects_token() {
        let token = TokenIssuer::new("a".to_string(), 1).issue("u").unwrap();
        let err = TokenIssuer::new("b".to_string(), 1).verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("secret".to_string(), -2);
        let token = issuer.issue("u").unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn huge_ttl_is_clamped_instead_of_panicking() {
        let issuer = TokenIssuer::new("secret".to_string(), i64::MAX);
        assert_eq!(issuer.ttl, chrono::Duration::hours(MAX_TTL_HOURS));
        let token = issuer.issue("u").unwrap();
        assert_eq!(issuer.verify(&token).unwrap().sub, "u");
    }
}
