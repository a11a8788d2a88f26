use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::extract::{extract_fields, extract_id, extract_json, extract_query};
use super::params::{non_empty, page_request, parse_bool, parse_f64};
use super::{ApiError, ApiResponse, AppState, CategoriesResponse, PaginatedResponse};
use crate::db::{BulkDeleteOutcome, PageRequest, ProductListOptions, SortOrder};
use crate::models::product::ProductDto;
use crate::services::{BulkCreateReport, ProductError};

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => Self::NotFound(err.to_string()),
            ProductError::Validation(messages) => Self::ValidationError(messages),
            ProductError::BadRequest(msg) => Self::BadRequest(msg),
            ProductError::Internal(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_available: Option<String>,
    pub in_stock: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ProductListQuery {
    #[must_use]
    pub fn into_parts(self) -> (ProductListOptions, PageRequest) {
        let page = page_request(self.page.as_deref(), self.per_page.as_deref());
        let options = ProductListOptions {
            search: non_empty(self.search),
            category: non_empty(self.category),
            is_available: parse_bool(self.is_available.as_deref()),
            in_stock: parse_bool(self.in_stock.as_deref()),
            min_price: parse_f64(self.min_price.as_deref()),
            max_price: parse_f64(self.max_price.as_deref()),
            sort_by: non_empty(self.sort_by),
            sort_order: SortOrder::parse(self.sort_order.as_deref()),
        };
        (options, page)
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub products: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProductListQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<ProductDto>>, ApiError> {
    let (options, page) = extract_query(query)?.into_parts();
    let products = state.product_service().list(&options, page).await?;
    Ok(Json(PaginatedResponse::from(products)))
}

/// GET /products/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CategoriesResponse>>, ApiError> {
    let categories = state.product_service().categories().await?;
    Ok(Json(ApiResponse::success(CategoriesResponse {
        count: categories.len(),
        categories,
    })))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let product = state.product_service().get(extract_id(id)?).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = extract_fields(body)?;
    let product = state.product_service().create(&fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            product,
            "Product created successfully",
        )),
    ))
}

/// PUT /products/{id}
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let id = extract_id(id)?;
    let fields = extract_fields(body)?;
    let product = state.product_service().update(id, &fields).await?;

    Ok(Json(ApiResponse::with_message(
        product,
        "Product updated successfully",
    )))
}

/// DELETE /products/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = extract_id(id)?;
    state.product_service().delete(id).await?;
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// POST /products/bulk
///
/// Valid items are created even when others are rejected. Only a batch in
/// which nothing could be created is an error.
pub async fn bulk_create_products(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BulkCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = extract_json(body)?;
    let report: BulkCreateReport = state
        .product_service()
        .bulk_create(&request.products)
        .await?;

    if report.created == 0 {
        let messages = report
            .errors
            .iter()
            .flat_map(|item| {
                item.messages
                    .iter()
                    .map(move |msg| format!("Item {}: {}", item.index, msg))
            })
            .collect();
        return Err(ApiError::ValidationError(messages));
    }

    let message = format!("Created {} products", report.created);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(report, message)),
    ))
}

/// DELETE /products/bulk
pub async fn bulk_delete_products(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BulkDeleteOutcome>>, ApiError> {
    let request = extract_json(body)?;
    let outcome = state.product_service().bulk_delete(&request.ids).await?;

    let message = format!("Deleted {} products", outcome.deleted.len());
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_price_range() {
        let query = ProductListQuery {
            min_price: Some("10".to_string()),
            max_price: Some("cheap".to_string()),
            in_stock: Some("true".to_string()),
            category: Some(String::new()),
            ..Default::default()
        };
        let (options, _) = query.into_parts();
        assert_eq!(options.min_price, Some(10.0));
        assert!(options.max_price.is_none());
        assert_eq!(options.in_stock, Some(true));
        assert!(options.category.is_none());
    }
}
