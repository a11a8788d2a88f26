use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ProductService, RateLimiter, SeaOrmAuthService, SeaOrmProductService,
    SeaOrmSystemService, SeaOrmUserService, SystemService, TokenSigner, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub rate_limiter: Arc<RateLimiter>,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub product_service: Arc<dyn ProductService>,

    pub system_service: Arc<dyn SystemService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store).await
    }

    /// Wires every service over an already migrated store and runs the admin
    /// bootstrap.
    pub async fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let signer = Arc::new(TokenSigner::from_config(&config.security));
        let rate_limiter = Arc::new(RateLimiter::in_memory(config.rate_limit.clone()));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            signer,
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;

        let product_service =
            Arc::new(SeaOrmProductService::new(store.clone())) as Arc<dyn ProductService>;

        let system_service =
            Arc::new(SeaOrmSystemService::new(store.clone())) as Arc<dyn SystemService>;

        auth_service
            .bootstrap_admin(&config.bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap admin account: {e}"))?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            rate_limiter,
            auth_service,
            user_service,
            product_service,
            system_service,
        })
    }
}
