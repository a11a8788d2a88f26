//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{Page, PageRequest, Store, UserConflict, UserListOptions, is_unique_violation};
use crate::models::user::{NewUser, UserChanges, UserDto};
use crate::services::auth_service::Identity;
use crate::services::user_service::{UserError, UserService};
use crate::validation::{Fields, Mode, validate_user};

const PRIVILEGED_FIELDS: [&str; 2] = ["role", "is_active"];

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<(), UserError> {
        let conflict = self
            .store
            .users()
            .find_conflict(username, email, exclude_id)
            .await?;

        match conflict {
            Some(UserConflict::Username) => {
                Err(UserError::Conflict("Username already exists".to_string()))
            }
            Some(UserConflict::Email) => {
                Err(UserError::Conflict("Email already exists".to_string()))
            }
            None => Ok(()),
        }
    }
}

fn map_write_error(err: anyhow::Error) -> UserError {
    if is_unique_violation(&err) {
        UserError::Conflict("Username or email already exists".to_string())
    } else {
        UserError::from(err)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(
        &self,
        options: &UserListOptions,
        page: PageRequest,
    ) -> Result<Page<UserDto>, UserError> {
        let page = self.store.users().list(options, page).await?;
        Ok(page.map(UserDto::from))
    }

    async fn get(&self, id: i32) -> Result<UserDto, UserError> {
        self.store
            .users()
            .get_by_id(id)
            .await?
            .map(UserDto::from)
            .ok_or(UserError::NotFound(id))
    }

    async fn create(&self, fields: &Fields) -> Result<UserDto, UserError> {
        let errors = validate_user(fields, Mode::Create);
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }

        let new_user = NewUser::from_fields(fields);
        self.ensure_unique(Some(&new_user.username), Some(&new_user.email), None)
            .await?;

        let user = self
            .store
            .users()
            .create(new_user, &self.security)
            .await
            .map_err(map_write_error)?;

        info!(user_id = user.id, role = %user.role, "User created");
        Ok(UserDto::from(user))
    }

    async fn update(
        &self,
        actor: &Identity,
        id: i32,
        fields: &Fields,
    ) -> Result<UserDto, UserError> {
        if !actor.is_admin() {
            if actor.user_id != id {
                return Err(UserError::Forbidden(
                    "You can only update your own account".to_string(),
                ));
            }
            if PRIVILEGED_FIELDS.iter().any(|f| fields.contains_key(*f)) {
                return Err(UserError::Forbidden(
                    "Only admins can change role or active status".to_string(),
                ));
            }
        }

        let errors = validate_user(fields, Mode::Update);
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }

        let changes = UserChanges::from_fields(fields);
        self.ensure_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))
            .await?;

        let user = self
            .store
            .users()
            .update(id, changes, &self.security)
            .await
            .map_err(map_write_error)?
            .ok_or(UserError::NotFound(id))?;

        info!(user_id = id, actor_id = actor.user_id, "User updated");
        Ok(UserDto::from(user))
    }

    async fn delete(&self, actor: &Identity, id: i32) -> Result<(), UserError> {
        if actor.user_id == id {
            return Err(UserError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.store.users().delete(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(user_id = id, actor_id = actor.user_id, "User deleted");
        Ok(())
    }
}
