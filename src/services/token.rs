//! Issues and verifies signed, time-bound access tokens (HS256 JWTs).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::entities::users::{self, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,

    pub username: String,

    pub role: Role,

    pub iat: i64,

    pub exp: i64,
}

impl Claims {
    /// Parses the subject back into a user id.
    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,

    /// Lifetime in seconds.
    pub expires_in: i64,
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.jwt_expiry_hours))
    }

    pub fn issue(&self, user: &users::Model) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_in: self.lifetime.num_seconds(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
