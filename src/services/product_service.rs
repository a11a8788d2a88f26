//! Domain service for the product catalog.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::{BulkDeleteOutcome, Page, PageRequest, ProductListOptions};
use crate::models::product::ProductDto;
use crate::validation::Fields;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product with ID {0} not found")]
    NotFound(i32),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ProductError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Violations for one rejected item of a batch, by position in the request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkItemError {
    pub index: usize,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkCreateReport {
    pub created: usize,
    pub products: Vec<ProductDto>,
    pub errors: Vec<BulkItemError>,
}

#[async_trait::async_trait]
pub trait ProductService: Send + Sync {
    async fn list(
        &self,
        options: &ProductListOptions,
        page: PageRequest,
    ) -> Result<Page<ProductDto>, ProductError>;

    async fn get(&self, id: i32) -> Result<ProductDto, ProductError>;

    async fn categories(&self) -> Result<Vec<String>, ProductError>;

    async fn create(&self, fields: &Fields) -> Result<ProductDto, ProductError>;

    async fn update(&self, id: i32, fields: &Fields) -> Result<ProductDto, ProductError>;

    async fn delete(&self, id: i32) -> Result<(), ProductError>;

    /// Validates every item independently and inserts the valid ones in a
    /// single transaction. Invalid items are reported, not fatal.
    async fn bulk_create(&self, items: &[Value]) -> Result<BulkCreateReport, ProductError>;

    async fn bulk_delete(&self, ids: &[i32]) -> Result<BulkDeleteOutcome, ProductError>;
}
