use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::constants::auth::API_KEY_HEX_LEN;
use crate::db::pagination::{Page, PageRequest, paginate};
use crate::db::query::{UserListOptions, user_query};
use crate::entities::users::Role;
use crate::entities::{api_keys, users};
use crate::models::now_timestamp;
use crate::models::user::{NewUser, UserChanges};

/// Which unique column an incoming username/email collides with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserConflict {
    Username,
    Email,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    /// Finds which of `username` / `email` is already taken by a user other than `exclude_id`.
    /// Username collisions are reported first.
    pub async fn find_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<UserConflict>> {
        let scope = |column: users::Column, value: &str| {
            let mut cond = Condition::all().add(column.eq(value));
            if let Some(id) = exclude_id {
                cond = cond.add(users::Column::Id.ne(id));
            }
            cond
        };

        if let Some(username) = username {
            let taken = users::Entity::find()
                .filter(scope(users::Column::Username, username))
                .count(&self.conn)
                .await
                .context("Failed to check username uniqueness")?;
            if taken > 0 {
                return Ok(Some(UserConflict::Username));
            }
        }

        if let Some(email) = email {
            let taken = users::Entity::find()
                .filter(scope(users::Column::Email, email))
                .count(&self.conn)
                .await
                .context("Failed to check email uniqueness")?;
            if taken > 0 {
                return Ok(Some(UserConflict::Email));
            }
        }

        Ok(None)
    }

    pub async fn create(&self, user: NewUser, security: &SecurityConfig) -> Result<users::Model> {
        let password_hash = match user.password {
            Some(password) => Some(hash_password_blocking(password, security).await?),
            None => None,
        };
        let now = now_timestamp();

        let active = users::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(password_hash),
            role: Set(user.role),
            is_active: Set(user.is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let txn = self.conn.begin().await?;
        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert user")?;
        txn.commit().await?;

        Ok(model)
    }

    /// Applies the present fields and always refreshes `updated_at`.
    /// Returns `None` when the user does not exist.
    pub async fn update(
        &self,
        id: i32,
        changes: UserChanges,
        security: &SecurityConfig,
    ) -> Result<Option<users::Model>> {
        let password_hash = match changes.password {
            Some(password) => Some(hash_password_blocking(password, security).await?),
            None => None,
        };

        let txn = self.conn.begin().await?;

        let Some(existing) = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = existing.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(Some(hash));
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(now_timestamp());

        let model = active
            .update(&txn)
            .await
            .context("Failed to update user")?;
        txn.commit().await?;

        Ok(Some(model))
    }

    /// Deletes the user together with every API key they own.
    /// Returns `false` when no such user exists.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        api_keys::Entity::delete_many()
            .filter(api_keys::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user's API keys")?;

        let result = users::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list(
        &self,
        options: &UserListOptions,
        page: PageRequest,
    ) -> Result<Page<users::Model>> {
        paginate(user_query(options), &self.conn, page)
            .await
            .context("Failed to list users")
    }

    pub async fn counts(&self) -> Result<UserCounts> {
        let total = users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;
        let active = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active users")?;
        let admins = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin))
            .count(&self.conn)
            .await
            .context("Failed to count admin users")?;

        Ok(UserCounts {
            total,
            active,
            admins,
        })
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        let admins = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin))
            .count(&self.conn)
            .await
            .context("Failed to check for admin users")?;
        Ok(admins > 0)
    }
}

async fn hash_password_blocking(password: String, security: &SecurityConfig) -> Result<String> {
    let config = security.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Verifies `password` against a stored PHC string.
/// Note: This uses `spawn_blocking` because Argon2 is CPU-intensive
/// and would block the async runtime if run directly.
pub async fn verify_password(password_hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key of `API_KEY_HEX_LEN` hex characters
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; API_KEY_HEX_LEN / 2] = rng.random();

    bytes.iter().fold(String::with_capacity(API_KEY_HEX_LEN), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
