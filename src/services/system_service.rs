//! Domain service for system-level operations: health and catalog statistics.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SystemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_users: u64,
    pub active_users: u64,
    pub admin_users: u64,
    pub total_products: u64,
    pub available_products: u64,
    pub out_of_stock_products: u64,
    pub total_categories: u64,
    pub inventory_value: f64,
}

#[async_trait::async_trait]
pub trait SystemService: Send + Sync {
    /// Reports liveness and database connectivity. A failed database probe
    /// yields an `unhealthy` report rather than an error.
    async fn health(&self, uptime_secs: u64) -> HealthReport;

    /// # Errors
    ///
    /// Returns [`SystemError::Database`] on query failures.
    async fn stats(&self) -> Result<CatalogStats, SystemError>;
}
