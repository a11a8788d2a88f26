//! `SeaORM` implementation of the `SystemService` trait.

use async_trait::async_trait;

use crate::constants::API_VERSION;
use crate::db::Store;
use crate::models::now_timestamp;
use crate::services::system_service::{CatalogStats, HealthReport, SystemError, SystemService};

pub struct SeaOrmSystemService {
    store: Store,
}

impl SeaOrmSystemService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SystemService for SeaOrmSystemService {
    async fn health(&self, uptime_secs: u64) -> HealthReport {
        let (status, database) = match self.store.ping().await {
            Ok(()) => ("healthy", "connected"),
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                ("unhealthy", "disconnected")
            }
        };

        HealthReport {
            status,
            database,
            version: API_VERSION,
            uptime_seconds: uptime_secs,
            timestamp: now_timestamp(),
        }
    }

    async fn stats(&self) -> Result<CatalogStats, SystemError> {
        let users = self.store.users().counts().await?;
        let products = self.store.products().counts().await?;

        Ok(CatalogStats {
            total_users: users.total,
            active_users: users.active,
            admin_users: users.admins,
            total_products: products.total,
            available_products: products.available,
            out_of_stock_products: products.out_of_stock,
            total_categories: products.categories,
            inventory_value: (products.inventory_value * 100.0).round() / 100.0,
        })
    }
}
