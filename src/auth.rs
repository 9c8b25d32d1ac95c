//! Password hashing and access-token issuance.
//!
//! Tokens are stateless: a token is valid as long as its signature checks out
//! and it has not expired. The role claim reflects the account at issuance
//! time and is never re-read from the store.

use std::sync::Arc;

use argon2::{self, Config as ArgonConfig};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] argon2::Error),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub role: String,
    pub iat: i64,
    pub exp: i64, // Expiration time as UTC timestamp
}

pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();
    Ok(argon2::hash_encoded(plaintext.as_bytes(), &salt, &config)?)
}

/// Malformed hashes count as a mismatch.
pub fn verify_password(hash: &str, plaintext: &str) -> bool {
    argon2::verify_encoded(hash, plaintext.as_bytes()).unwrap_or(false)
}

/// HS256 signer/verifier over a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        TokenService {
            secret: Arc::from(secret.as_ref()),
            ttl,
        }
    }

    pub fn issue(&self, subject: &str, role: &str) -> Result<String, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::Signing("signing secret is not configured".into()));
        }

        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}
