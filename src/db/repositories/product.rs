use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;

use crate::db::pagination::{Page, PageRequest, paginate};
use crate::db::query::{ProductListOptions, product_query};
use crate::entities::products;
use crate::models::now_timestamp;
use crate::models::product::{NewProduct, ProductChanges};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductCounts {
    pub total: u64,
    pub available: u64,
    pub out_of_stock: u64,
    pub categories: u64,
    pub inventory_value: f64,
}

/// Outcome of a batch delete: ids that were removed and ids that did not exist.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<i32>,
    pub not_found: Vec<i32>,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<products::Model>> {
        products::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product by ID")
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let count = products::Entity::find()
            .filter(products::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to query product by name")?;
        Ok(count > 0)
    }

    pub async fn create(&self, product: NewProduct) -> Result<products::Model> {
        let txn = self.conn.begin().await?;
        let model = new_active_model(product, now_timestamp())
            .insert(&txn)
            .await
            .context("Failed to insert product")?;
        txn.commit().await?;
        Ok(model)
    }

    /// Inserts every product in one transaction; either all rows land or none do.
    pub async fn bulk_create(&self, items: Vec<NewProduct>) -> Result<Vec<products::Model>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_timestamp();
        let txn = self.conn.begin().await?;

        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let model = new_active_model(item, now.clone())
                .insert(&txn)
                .await
                .context("Failed to insert product in batch")?;
            created.push(model);
        }

        txn.commit().await?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Option<products::Model>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = products::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query product for update")?
        else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(quantity) = changes.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(is_available) = changes.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(now_timestamp());

        let model = active
            .update(&txn)
            .await
            .context("Failed to update product")?;
        txn.commit().await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = products::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete product")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<BulkDeleteOutcome> {
        if ids.is_empty() {
            return Ok(BulkDeleteOutcome::default());
        }

        let txn = self.conn.begin().await?;

        let existing: Vec<i32> = products::Entity::find()
            .select_only()
            .column(products::Column::Id)
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&txn)
            .await
            .context("Failed to look up products for batch delete")?;

        if !existing.is_empty() {
            products::Entity::delete_many()
                .filter(products::Column::Id.is_in(existing.iter().copied()))
                .exec(&txn)
                .await
                .context("Failed to delete products in batch")?;
        }

        txn.commit().await?;

        let mut outcome = BulkDeleteOutcome::default();
        for id in ids {
            let bucket = if existing.contains(id) {
                &mut outcome.deleted
            } else {
                &mut outcome.not_found
            };
            if !bucket.contains(id) {
                bucket.push(*id);
            }
        }
        Ok(outcome)
    }

    pub async fn list(
        &self,
        options: &ProductListOptions,
        page: PageRequest,
    ) -> Result<Page<products::Model>> {
        paginate(product_query(options), &self.conn, page)
            .await
            .context("Failed to list products")
    }

    /// Distinct non-empty categories in ascending order.
    pub async fn categories(&self) -> Result<Vec<String>> {
        products::Entity::find()
            .select_only()
            .column(products::Column::Category)
            .distinct()
            .filter(products::Column::Category.is_not_null())
            .filter(products::Column::Category.ne(""))
            .order_by_asc(products::Column::Category)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list product categories")
    }

    pub async fn counts(&self) -> Result<ProductCounts> {
        let total = products::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count products")?;
        let available = products::Entity::find()
            .filter(products::Column::IsAvailable.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count available products")?;
        let out_of_stock = products::Entity::find()
            .filter(products::Column::Quantity.lte(0))
            .count(&self.conn)
            .await
            .context("Failed to count out-of-stock products")?;
        let categories = self.categories().await?.len() as u64;

        let inventory_value: Option<Option<f64>> = products::Entity::find()
            .select_only()
            .column_as(
                Expr::cust("CAST(COALESCE(SUM(price * quantity), 0) AS REAL)"),
                "inventory_value",
            )
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to compute inventory value")?;

        Ok(ProductCounts {
            total,
            available,
            out_of_stock,
            categories,
            inventory_value: inventory_value.flatten().unwrap_or_default(),
        })
    }
}

fn new_active_model(product: NewProduct, now: String) -> products::ActiveModel {
    products::ActiveModel {
        name: Set(product.name),
        description: Set(product.description),
        price: Set(product.price),
        quantity: Set(product.quantity),
        category: Set(product.category),
        is_available: Set(product.is_available),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
}
