use serde::{Deserialize, Serialize};

use crate::constants::auth::API_KEY_VISIBLE_PREFIX;
use crate::entities::api_keys;

/// Listing form: only a prefix of the key is revealed.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyDto {
    pub id: i32,
    pub name: String,
    pub key_preview: String,
    pub is_active: bool,
    pub created_at: String,
    pub expires_at: Option<String>,
}

impl From<api_keys::Model> for ApiKeyDto {
    fn from(model: api_keys::Model) -> Self {
        let prefix: String = model.key.chars().take(API_KEY_VISIBLE_PREFIX).collect();
        Self {
            id: model.id,
            name: model.name,
            key_preview: format!("{prefix}..."),
            is_active: model.is_active,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}

/// Returned once, at creation, with the full key.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApiKeyDto {
    pub id: i32,
    pub name: String,
    pub key: String,
    pub is_active: bool,
    pub created_at: String,
    pub expires_at: Option<String>,
}

impl From<api_keys::Model> for CreatedApiKeyDto {
    fn from(model: api_keys::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            key: model.key,
            is_active: model.is_active,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: Option<String>,
    pub expires_in_days: Option<u32>,
}
