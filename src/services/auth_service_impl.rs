//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::constants::limits::{API_KEY_MAX_TTL_DAYS, API_KEY_NAME_MAX};
use crate::db::repositories::user::verify_password;
use crate::db::{Store, UserConflict, is_unique_violation};
use crate::entities::users::{self, Role};
use crate::models::api_key::{ApiKeyDto, CreateApiKeyRequest, CreatedApiKeyDto};
use crate::models::format_timestamp;
use crate::models::user::{NewUser, UserDto};
use crate::services::auth_service::{AuthError, AuthMethod, AuthService, AuthSession, Identity};
use crate::services::token::{TokenError, TokenSigner};
use crate::validation::{Fields, validate_registration};

const DEFAULT_API_KEY_NAME: &str = "API Key";

pub struct SeaOrmAuthService {
    store: Store,
    signer: Arc<TokenSigner>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, signer: Arc<TokenSigner>, security: SecurityConfig) -> Self {
        Self {
            store,
            signer,
            security,
        }
    }

    fn session_for(&self, user: users::Model) -> Result<AuthSession, AuthError> {
        let issued = self
            .signer
            .issue(&user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(AuthSession {
            user: UserDto::from(user),
            token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
        })
    }

    async fn identity_from_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.signer.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid | TokenError::Signing(_) => AuthError::InvalidToken,
        })?;

        let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;
        let user = self
            .store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(Identity {
            user_id: user.id,
            username: user.username,
            role: user.role,
            method: AuthMethod::Token,
        })
    }

    async fn identity_from_api_key(&self, key: &str) -> Result<Identity, AuthError> {
        let (_, user) = self
            .store
            .api_keys()
            .find_valid(key)
            .await?
            .ok_or(AuthError::InvalidApiKey)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(Identity {
            user_id: user.id,
            username: user.username,
            role: user.role,
            method: AuthMethod::ApiKey,
        })
    }
}

fn conflict_message(conflict: UserConflict) -> &'static str {
    match conflict {
        UserConflict::Username => "Username already exists",
        UserConflict::Email => "Email already exists",
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, fields: &Fields) -> Result<AuthSession, AuthError> {
        let errors = validate_registration(fields);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        // Self-registration always yields an active regular user.
        let new_user = NewUser {
            role: Role::User,
            is_active: true,
            ..NewUser::from_fields(fields)
        };

        let users = self.store.users();
        if let Some(conflict) = users
            .find_conflict(Some(&new_user.username), Some(&new_user.email), None)
            .await?
        {
            return Err(AuthError::Conflict(conflict_message(conflict).to_string()));
        }

        let user = users
            .create(new_user, &self.security)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict("Username or email already exists".to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        info!(user_id = user.id, username = %user.username, "User registered");
        self.session_for(user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .store
            .users()
            .get_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.clone() else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password_hash, password.to_string()).await? {
            warn!(username = %username, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        info!(user_id = user.id, "User logged in");
        self.session_for(user)
    }

    async fn authenticate(
        &self,
        bearer: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Identity, AuthError> {
        match (bearer, api_key) {
            (Some(token), _) => self.identity_from_token(token).await,
            (None, Some(key)) => self.identity_from_api_key(key).await,
            (None, None) => Err(AuthError::MissingCredentials),
        }
    }

    async fn current_user(&self, identity: &Identity) -> Result<UserDto, AuthError> {
        self.store
            .users()
            .get_by_id(identity.user_id)
            .await?
            .map(UserDto::from)
            .ok_or(AuthError::InvalidToken)
    }

    async fn list_api_keys(&self, user_id: i32) -> Result<Vec<ApiKeyDto>, AuthError> {
        let keys = self.store.api_keys().list_for_user(user_id).await?;
        Ok(keys.into_iter().map(ApiKeyDto::from).collect())
    }

    async fn create_api_key(
        &self,
        user_id: i32,
        request: CreateApiKeyRequest,
    ) -> Result<CreatedApiKeyDto, AuthError> {
        let mut errors = Vec::new();

        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_API_KEY_NAME.to_string());
        if name.chars().count() > API_KEY_NAME_MAX {
            errors.push(format!(
                "API key name must not exceed {API_KEY_NAME_MAX} characters"
            ));
        }
        let expires_at = match request.expires_in_days {
            None => None,
            Some(0) => {
                errors.push("expires_in_days must be at least 1".to_string());
                None
            }
            Some(days) if days > API_KEY_MAX_TTL_DAYS => {
                errors.push(format!(
                    "expires_in_days must not exceed {API_KEY_MAX_TTL_DAYS}"
                ));
                None
            }
            Some(days) => {
                let expiry = Duration::try_days(i64::from(days))
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl));
                if expiry.is_none() {
                    errors.push("expires_in_days is out of range".to_string());
                }
                expiry.map(format_timestamp)
            }
        };
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let key = self
            .store
            .api_keys()
            .create(user_id, name, expires_at)
            .await?;

        info!(user_id, key_id = key.id, "API key created");
        Ok(CreatedApiKeyDto::from(key))
    }

    async fn revoke_api_key(&self, user_id: i32, key_id: i32) -> Result<(), AuthError> {
        let repo = self.store.api_keys();
        match repo.get(key_id).await? {
            Some(key) if key.user_id == user_id => {
                repo.delete(key_id).await?;
                info!(user_id, key_id, "API key revoked");
                Ok(())
            }
            _ => Err(AuthError::ApiKeyNotFound(key_id)),
        }
    }

    async fn bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> Result<Option<UserDto>, AuthError> {
        let Some(password) = bootstrap.admin_password.clone() else {
            return Ok(None);
        };

        let users = self.store.users();
        if users.admin_exists().await? {
            return Ok(None);
        }

        if users
            .find_conflict(
                Some(&bootstrap.admin_username),
                Some(&bootstrap.admin_email),
                None,
            )
            .await?
            .is_some()
        {
            warn!(
                username = %bootstrap.admin_username,
                "Bootstrap admin skipped: username or email already in use"
            );
            return Ok(None);
        }

        let admin = users
            .create(
                NewUser {
                    username: bootstrap.admin_username.clone(),
                    email: bootstrap.admin_email.clone(),
                    password: Some(password),
                    role: Role::Admin,
                    is_active: true,
                },
                &self.security,
            )
            .await?;

        info!(username = %admin.username, "Bootstrap admin account created");
        Ok(Some(UserDto::from(admin)))
    }
}
