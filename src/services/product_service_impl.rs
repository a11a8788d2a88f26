//! `SeaORM` implementation of the `ProductService` trait.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::constants::limits::MAX_BULK_ITEMS;
use crate::db::{BulkDeleteOutcome, Page, PageRequest, ProductListOptions, Store};
use crate::models::product::{NewProduct, ProductChanges, ProductDto};
use crate::services::product_service::{
    BulkCreateReport, BulkItemError, ProductError, ProductService,
};
use crate::validation::{Fields, Mode, validate_product};

pub struct SeaOrmProductService {
    store: Store,
}

impl SeaOrmProductService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Splits a batch into insertable products and per-item violations.
fn partition_batch(items: &[Value]) -> (Vec<NewProduct>, Vec<BulkItemError>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            errors.push(BulkItemError {
                index,
                messages: vec!["Item must be a JSON object".to_string()],
            });
            continue;
        };

        let messages = validate_product(fields, Mode::Create);
        if messages.is_empty() {
            valid.push(NewProduct::from_fields(fields));
        } else {
            errors.push(BulkItemError { index, messages });
        }
    }

    (valid, errors)
}

#[async_trait]
impl ProductService for SeaOrmProductService {
    async fn list(
        &self,
        options: &ProductListOptions,
        page: PageRequest,
    ) -> Result<Page<ProductDto>, ProductError> {
        let page = self.store.products().list(options, page).await?;
        Ok(page.map(ProductDto::from))
    }

    async fn get(&self, id: i32) -> Result<ProductDto, ProductError> {
        self.store
            .products()
            .get(id)
            .await?
            .map(ProductDto::from)
            .ok_or(ProductError::NotFound(id))
    }

    async fn categories(&self) -> Result<Vec<String>, ProductError> {
        Ok(self.store.products().categories().await?)
    }

    async fn create(&self, fields: &Fields) -> Result<ProductDto, ProductError> {
        let errors = validate_product(fields, Mode::Create);
        if !errors.is_empty() {
            return Err(ProductError::Validation(errors));
        }

        let product = self
            .store
            .products()
            .create(NewProduct::from_fields(fields))
            .await?;

        info!(product_id = product.id, "Product created");
        Ok(ProductDto::from(product))
    }

    async fn update(&self, id: i32, fields: &Fields) -> Result<ProductDto, ProductError> {
        let errors = validate_product(fields, Mode::Update);
        if !errors.is_empty() {
            return Err(ProductError::Validation(errors));
        }

        let product = self
            .store
            .products()
            .update(id, ProductChanges::from_fields(fields))
            .await?
            .ok_or(ProductError::NotFound(id))?;

        info!(product_id = id, "Product updated");
        Ok(ProductDto::from(product))
    }

    async fn delete(&self, id: i32) -> Result<(), ProductError> {
        if !self.store.products().delete(id).await? {
            return Err(ProductError::NotFound(id));
        }

        info!(product_id = id, "Product deleted");
        Ok(())
    }

    async fn bulk_create(&self, items: &[Value]) -> Result<BulkCreateReport, ProductError> {
        if items.is_empty() {
            return Err(ProductError::BadRequest("No products provided".to_string()));
        }
        if items.len() > MAX_BULK_ITEMS {
            return Err(ProductError::BadRequest(format!(
                "A batch may contain at most {MAX_BULK_ITEMS} products"
            )));
        }

        let (valid, errors) = partition_batch(items);
        let created = self.store.products().bulk_create(valid).await?;

        info!(
            created = created.len(),
            rejected = errors.len(),
            "Bulk product create finished"
        );

        Ok(BulkCreateReport {
            created: created.len(),
            products: created.into_iter().map(ProductDto::from).collect(),
            errors,
        })
    }

    async fn bulk_delete(&self, ids: &[i32]) -> Result<BulkDeleteOutcome, ProductError> {
        if ids.is_empty() {
            return Err(ProductError::BadRequest("No product IDs provided".to_string()));
        }
        if ids.len() > MAX_BULK_ITEMS {
            return Err(ProductError::BadRequest(format!(
                "A batch may contain at most {MAX_BULK_ITEMS} IDs"
            )));
        }

        let outcome = self.store.products().bulk_delete(ids).await?;
        info!(
            deleted = outcome.deleted.len(),
            not_found = outcome.not_found.len(),
            "Bulk product delete finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partition_batch_reports_by_index() {
        let items = vec![
            json!({"name": "A", "price": 1}),
            json!({"price": -1}),
            json!("not an object"),
            json!({"name": "B", "price": "2.5", "quantity": 3}),
        ];

        let (valid, errors) = partition_batch(&items);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[1].name, "B");
        assert_eq!(valid[1].quantity, 3);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].index, 1);
        assert_eq!(
            errors[0].messages,
            vec!["Product name is required", "Price must be a positive number"]
        );
        assert_eq!(errors[1].index, 2);
    }
}
