use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{api_keys, users};
use crate::models::now_timestamp;

use super::user::generate_api_key;

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        name: String,
        expires_at: Option<String>,
    ) -> Result<api_keys::Model> {
        let active = api_keys::ActiveModel {
            key: Set(generate_api_key()),
            name: Set(name),
            user_id: Set(user_id),
            is_active: Set(true),
            created_at: Set(now_timestamp()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert API key")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<api_keys::Model>> {
        api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .order_by_asc(api_keys::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list API keys")
    }

    pub async fn get(&self, id: i32) -> Result<Option<api_keys::Model>> {
        api_keys::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query API key by ID")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = api_keys::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete API key")?;
        Ok(result.rows_affected > 0)
    }

    /// Resolves an active, unexpired key to its owner.
    /// RFC 3339 timestamps in UTC compare correctly as strings.
    pub async fn find_valid(&self, key: &str) -> Result<Option<(api_keys::Model, users::Model)>> {
        let now = now_timestamp();

        let found = api_keys::Entity::find()
            .filter(api_keys::Column::Key.eq(key))
            .filter(api_keys::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(api_keys::Column::ExpiresAt.is_null())
                    .add(api_keys::Column::ExpiresAt.gt(now)),
            )
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query API key")?;

        Ok(found.and_then(|(key, user)| user.map(|user| (key, user))))
    }
}
