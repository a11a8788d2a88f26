use serde::Serialize;
use serde_json::Value;

use crate::entities::products;
use crate::validation::{Fields, parse_price, parse_quantity};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub category: Option<String>,
    pub is_available: bool,
    pub in_stock: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<products::Model> for ProductDto {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            in_stock: model.quantity > 0,
            name: model.name,
            description: model.description,
            price: model.price,
            quantity: model.quantity,
            category: model.category,
            is_available: model.is_available,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub category: Option<String>,
    pub is_available: bool,
}

impl NewProduct {
    /// Builds a product from already validated fields.
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Self {
        let changes = ProductChanges::from_fields(fields);
        Self {
            name: changes.name.unwrap_or_default(),
            description: changes.description.flatten(),
            price: changes.price.unwrap_or_default(),
            quantity: changes.quantity.unwrap_or(0),
            category: changes.category.flatten(),
            is_available: changes.is_available.unwrap_or(true),
        }
    }
}

/// Partial update. Nullable columns use `Option<Option<_>>` so an explicit
/// `null` clears the value while an absent key keeps it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub category: Option<Option<String>>,
    pub is_available: Option<bool>,
}

impl ProductChanges {
    #[must_use]
    pub fn from_fields(fields: &Fields) -> Self {
        let nullable = |key: &str| {
            fields
                .get(key)
                .map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
        };

        Self {
            name: fields.get("name").and_then(Value::as_str).map(str::to_string),
            description: nullable("description"),
            price: fields.get("price").and_then(parse_price),
            quantity: fields
                .get("quantity")
                .and_then(parse_quantity)
                .and_then(|q| i32::try_from(q).ok()),
            category: nullable("category"),
            is_available: fields.get("is_available").and_then(Value::as_bool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_product_defaults() {
        let fields = json!({"name": "X", "price": 10}).as_object().cloned().unwrap();
        let product = NewProduct::from_fields(&fields);
        assert_eq!(product.name, "X");
        assert!((product.price - 10.0).abs() < f64::EPSILON);
        assert_eq!(product.quantity, 0);
        assert!(product.is_available);
        assert!(product.category.is_none());
    }

    #[test]
    fn test_changes_distinguish_null_from_absent() {
        let fields = json!({"category": null, "price": "4.5"})
            .as_object()
            .cloned()
            .unwrap();
        let changes = ProductChanges::from_fields(&fields);
        assert_eq!(changes.category, Some(None));
        assert_eq!(changes.description, None);
        assert_eq!(changes.price, Some(4.5));
    }
}
