//! Argon2 password hashing, run on actix's blocking pool so a request
//! waiting on a hash never stalls the worker thread.

use actix_web::web;
use argon2::{self, Config as ArgonConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// An encoded Argon2 hash. The only way to build one from a clear password
/// is [`hash`], so a record holding a `PasswordHash` never carries the
/// password itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub async fn hash(password: String) -> ApiResult<PasswordHash> {
    web::block(move || hash_blocking(&password))
        .await
        .map_err(|e| ApiError::PasswordHash(e.to_string()))?
}

/// `Ok(false)` is a mismatch; `Err` means the stored hash could not be read.
pub async fn verify(password: String, stored: PasswordHash) -> ApiResult<bool> {
    web::block(move || {
        argon2::verify_encoded(stored.as_str(), password.as_bytes())
            .map_err(|e| ApiError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| ApiError::PasswordHash(e.to_string()))?
}

fn hash_blocking(password: &str) -> ApiResult<PasswordHash> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map(PasswordHash)
        .map_err(|e| ApiError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn hash_then_verify() {
        let hashed = hash("hunter2".to_string()).await.unwrap();
        assert_ne!(hashed.as_str(), "hunter2");
        assert!(verify("hunter2".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify("hunter3".to_string(), hashed).await.unwrap());
    }

    #[actix_web::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash("pw".to_string()).await.unwrap();
        let b = hash("pw".to_string()).await.unwrap();
        assert_ne!(a, b);
    }

    #[actix_web::test]
    async fn corrupt_hash_is_an_error_not_a_mismatch() {
        let stored: PasswordHash = serde_json::from_str(r#""not-a-hash""#).unwrap();
        let err = verify("pw".to_string(), stored).await.unwrap_err();
        assert!(matches!(err, ApiError::PasswordHash(_)));
    }
}
