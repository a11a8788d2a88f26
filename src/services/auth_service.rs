//! Domain service for authentication.
//!
//! Handles registration, password login, credential verification for the
//! access gate, and per-user API key management.

use serde::Serialize;
use thiserror::Error;

use crate::config::BootstrapConfig;
use crate::entities::users::Role;
use crate::models::api_key::{ApiKeyDto, CreateApiKeyRequest, CreatedApiKeyDto};
use crate::models::user::UserDto;
use crate::validation::Fields;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid or expired API key")]
    InvalidApiKey,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Conflict(String),

    #[error("API key with ID {0} not found")]
    ApiKeyNotFound(i32),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// How a request proved who it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Token,
    ApiKey,
}

/// A verified caller, attached to the request by the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub method: AuthMethod,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A freshly issued access token together with the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserDto,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a regular user from a raw registration body and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with every violation, or
    /// [`AuthError::Conflict`] when the username or email is taken.
    async fn register(&self, fields: &Fields) -> Result<AuthSession, AuthError>;

    /// Verifies a username/password pair and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for unknown users, wrong
    /// passwords and accounts without a password.
    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolves a bearer token or API key to an identity. A bearer token wins
    /// when both are present.
    async fn authenticate(
        &self,
        bearer: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Identity, AuthError>;

    async fn current_user(&self, identity: &Identity) -> Result<UserDto, AuthError>;

    async fn list_api_keys(&self, user_id: i32) -> Result<Vec<ApiKeyDto>, AuthError>;

    async fn create_api_key(
        &self,
        user_id: i32,
        request: CreateApiKeyRequest,
    ) -> Result<CreatedApiKeyDto, AuthError>;

    /// Deletes one of the caller's keys. Keys owned by someone else are
    /// reported as not found.
    async fn revoke_api_key(&self, user_id: i32, key_id: i32) -> Result<(), AuthError>;

    /// Creates the configured admin account when no admin exists yet.
    /// Returns the created user, or `None` when nothing was done.
    async fn bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> Result<Option<UserDto>, AuthError>;
}
