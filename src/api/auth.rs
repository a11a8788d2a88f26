use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Request, State, rejection::JsonRejection, rejection::PathRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::extract::{extract_fields, extract_id, extract_optional_json};
use super::{ApiError, ApiResponse, AppState};
use crate::models::api_key::{ApiKeyDto, CreateApiKeyRequest, CreatedApiKeyDto};
use crate::models::user::UserDto;
use crate::services::{AuthError, AuthMethod, AuthSession, Identity};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::InvalidApiKey
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => Self::Unauthorized(err.to_string()),
            AuthError::Validation(messages) => Self::ValidationError(messages),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::ApiKeyNotFound(_) => Self::NotFound(err.to_string()),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Access gate
// ============================================================================

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    Admin,
}

pub async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, Capability::Authenticated, request, next).await
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, Capability::Admin, request, next).await
}

/// Verifies the credential (401 on failure), then the role (403), and hands
/// the resolved [`Identity`] to the handler through request extensions.
async fn gate(
    state: &AppState,
    capability: Capability,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key_header = state.config().read().await.security.api_key_header.clone();
    let identity = {
        let headers = request.headers();
        let bearer = bearer_token(headers);
        let api_key = header_str(headers, &api_key_header);

        state.auth_service().authenticate(bearer, api_key).await?
    };

    tracing::Span::current().record("user_id", identity.user_id);

    if capability == Capability::Admin && !identity.is_admin() {
        tracing::warn!(user_id = identity.user_id, "Admin capability denied");
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_str(headers, header::AUTHORIZATION.as_str())?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub user: UserDto,
    pub auth_method: AuthMethod,
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = extract_fields(body)?;
    let session = state.auth_service().register(&fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            session,
            "User registered successfully",
        )),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let fields = extract_fields(body)?;

    let username = fields
        .get("username")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let password = fields
        .get("password")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    let (Some(username), Some(password)) = (username, password) else {
        let mut errors = Vec::new();
        if username.is_none() {
            errors.push("Username is required".to_string());
        }
        if password.is_none() {
            errors.push("Password is required".to_string());
        }
        return Err(ApiError::ValidationError(errors));
    };

    let session = state.auth_service().login(username, password).await?;
    Ok(Json(ApiResponse::with_message(session, "Login successful")))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<CurrentUserResponse>>, ApiError> {
    let user = state.auth_service().current_user(&identity).await?;

    Ok(Json(ApiResponse::success(CurrentUserResponse {
        user,
        auth_method: identity.method,
    })))
}

/// GET /auth/api-keys
pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<ApiKeyDto>>>, ApiError> {
    let keys = state.auth_service().list_api_keys(identity.user_id).await?;
    Ok(Json(ApiResponse::success(keys)))
}

/// POST /auth/api-keys
///
/// The body is optional. The full key is only ever returned here.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateApiKeyRequest = extract_optional_json(&body)?;
    let key: CreatedApiKeyDto = state
        .auth_service()
        .create_api_key(identity.user_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            key,
            "API key created. Store it now, it will not be shown again",
        )),
    ))
}

/// DELETE /auth/api-keys/{id}
pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let key_id = extract_id(id)?;
    state
        .auth_service()
        .revoke_api_key(identity.user_id, key_id)
        .await?;

    Ok(Json(ApiResponse::message("API key revoked successfully")))
}
