use serde::Serialize;
use serde_json::Value;

use crate::entities::users::{self, Role};
use crate::validation::Fields;

/// User representation returned to clients (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl NewUser {
    /// Builds a user from already validated fields.
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Self {
        let changes = UserChanges::from_fields(fields);
        Self {
            username: changes.username.unwrap_or_default(),
            email: changes.email.unwrap_or_default(),
            password: changes.password,
            role: changes.role.unwrap_or(Role::User),
            is_active: changes.is_active.unwrap_or(true),
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Self {
        let string = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            username: string("username"),
            email: string("email"),
            password: string("password"),
            role: fields
                .get("role")
                .and_then(Value::as_str)
                .and_then(Role::parse),
            is_active: fields.get("is_active").and_then(Value::as_bool),
        }
    }
}
