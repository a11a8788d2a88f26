use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::extract::{extract_fields, extract_id, extract_query};
use super::params::{non_empty, page_request, parse_bool};
use super::{ApiError, ApiResponse, AppState, PaginatedResponse};
use crate::db::{PageRequest, SortOrder, UserListOptions};
use crate::entities::users::Role;
use crate::models::user::UserDto;
use crate::services::{Identity, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::Validation(messages) => Self::ValidationError(messages),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Forbidden(msg) => Self::Forbidden(msg),
            UserError::Internal(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl UserListQuery {
    #[must_use]
    pub fn into_parts(self) -> (UserListOptions, PageRequest) {
        let page = page_request(self.page.as_deref(), self.per_page.as_deref());
        let options = UserListOptions {
            search: non_empty(self.search),
            role: self.role.as_deref().and_then(Role::parse),
            is_active: parse_bool(self.is_active.as_deref()),
            sort_by: non_empty(self.sort_by),
            sort_order: SortOrder::parse(self.sort_order.as_deref()),
        };
        (options, page)
    }
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<UserDto>>, ApiError> {
    let (options, page) = extract_query(query)?.into_parts();
    let users = state.user_service().list(&options, page).await?;
    Ok(Json(PaginatedResponse::from(users)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().get(extract_id(id)?).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = extract_fields(body)?;
    let user = state.user_service().create(&fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user, "User created successfully")),
    ))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = extract_id(id)?;
    let fields = extract_fields(body)?;
    let user = state.user_service().update(&identity, id, &fields).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User updated successfully",
    )))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = extract_id(id)?;
    state.user_service().delete(&identity, id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
