//! Domain service for user accounts.

use thiserror::Error;

use crate::db::{Page, PageRequest, UserListOptions};
use crate::models::user::UserDto;
use crate::services::auth_service::Identity;
use crate::validation::Fields;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with ID {0} not found")]
    NotFound(i32),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list(
        &self,
        options: &UserListOptions,
        page: PageRequest,
    ) -> Result<Page<UserDto>, UserError>;

    async fn get(&self, id: i32) -> Result<UserDto, UserError>;

    /// Admin-issued creation; any field may be set, including role.
    async fn create(&self, fields: &Fields) -> Result<UserDto, UserError>;

    /// Partial update on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Forbidden`] when a non-admin targets another
    /// account or tries to change `role` / `is_active`.
    async fn update(
        &self,
        actor: &Identity,
        id: i32,
        fields: &Fields,
    ) -> Result<UserDto, UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::Forbidden`] when `actor` targets their own account.
    async fn delete(&self, actor: &Identity, id: i32) -> Result<(), UserError>;
}
