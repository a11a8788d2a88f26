mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::{Value, json};

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let created = app
        .create_product(&admin, json!({"name": "X", "price": 10}))
        .await;
    assert_eq!(created["name"], "X");
    assert_eq!(created["price"], 10.0);
    assert_eq!(created["quantity"], 0);
    assert_eq!(created["in_stock"], false);
    assert_eq!(created["is_available"], true);
    let id = created["id"].as_i64().unwrap();

    let response = app.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], created);

    let response = app
        .put(
            &format!("/api/products/{id}"),
            Some(&admin),
            json!({"price": -5}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["messages"],
        json!(["Price must be a positive number"])
    );

    let response = app
        .delete(&format!("/api/products/{id}"), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Product deleted successfully");

    let response = app.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body["message"],
        format!("Product with ID {id} not found")
    );
}

#[tokio::test]
async fn test_writes_require_authentication() {
    let app = spawn_app().await;

    let response = app
        .post("/api/products", None, json!({"name": "X", "price": 1}))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Any authenticated caller may write products
    let (_, token) = app.register("shopkeeper").await;
    app.create_product(&token, json!({"name": "Y", "price": "2.50", "quantity": 3}))
        .await;

    let response = app.get("/api/products", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["price"], 2.5);
    assert_eq!(response.body["data"][0]["in_stock"], true);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let created = app
        .create_product(
            &admin,
            json!({"name": "Lamp", "price": 20, "category": "Home", "description": "Warm"}),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/api/products/{id}"),
            Some(&admin),
            json!({"quantity": 4, "description": null}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let updated = &response.body["data"];
    assert_eq!(updated["quantity"], 4);
    assert_eq!(updated["in_stock"], true);
    assert!(updated["description"].is_null());
    assert_eq!(updated["name"], "Lamp");
    assert_eq!(updated["category"], "Home");
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn test_create_collects_all_violations() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/api/products",
            Some(&admin),
            json!({"quantity": -1, "category": 7}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Validation Error");
    assert_eq!(
        response.body["messages"],
        json!([
            "Product name is required",
            "Price is required",
            "Quantity must be a non-negative integer",
            "Category must be a string"
        ])
    );
}

#[tokio::test]
async fn test_pagination_over_fifteen_products() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for i in 0..15 {
        app.create_product(&admin, json!({"name": format!("P{i:02}"), "price": i}))
            .await;
    }

    let response = app.get("/api/products?page=1&per_page=5", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 5);
    let pagination = &response.body["pagination"];
    assert_eq!(pagination["total_pages"], 3);
    assert_eq!(pagination["total_items"], 15);
    assert_eq!(pagination["has_next"], true);
    assert_eq!(pagination["has_prev"], false);

    let response = app.get("/api/products?page=3&per_page=5", None).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(response.body["pagination"]["has_next"], false);
    assert_eq!(response.body["pagination"]["has_prev"], true);

    let response = app.get("/api/products?page=2&per_page=10", None).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 5);

    let response = app.get("/api/products?page=4&per_page=5", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"].as_array().unwrap().is_empty());
    assert_eq!(response.body["pagination"]["total_pages"], 3);

    // Default sort is newest first with a stable id tiebreaker
    let response = app
        .get("/api/products?per_page=100&sort_by=id&sort_order=asc", None)
        .await;
    let all = names(&response.body);
    assert_eq!(all.first().map(String::as_str), Some("P00"));
    assert_eq!(all.len(), 15);
}

#[tokio::test]
async fn test_empty_collection_has_zero_pages() {
    let app = spawn_app().await;

    let response = app.get("/api/products", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total_pages"], 0);
    assert_eq!(response.body["pagination"]["per_page"], 10);
    assert_eq!(response.body["pagination"]["has_next"], false);
}

#[tokio::test]
async fn test_filters_search_and_sort() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let catalog = [
        ("Laptop Pro", "Fast machine", 1299.99, "Electronics", 5),
        ("Wireless Mouse", "Ergonomic", 29.99, "Electronics", 0),
        ("Desk Lamp", "Adjustable laptop light", 39.99, "Furniture", 12),
        ("Notebook", "Spiral bound", 12.99, "Office Supplies", 200),
    ];
    for (name, description, price, category, quantity) in catalog {
        app.create_product(
            &admin,
            json!({
                "name": name,
                "description": description,
                "price": price,
                "category": category,
                "quantity": quantity
            }),
        )
        .await;
    }

    let response = app.get("/api/products?category=Electronics", None).await;
    assert_eq!(response.body["pagination"]["total_items"], 2);

    let response = app
        .get("/api/products?min_price=20&max_price=39.99&sort_by=price&sort_order=asc", None)
        .await;
    assert_eq!(names(&response.body), vec!["Wireless Mouse", "Desk Lamp"]);

    let response = app.get("/api/products?in_stock=false", None).await;
    assert_eq!(names(&response.body), vec!["Wireless Mouse"]);

    // Search spans name and description, case-insensitively
    let response = app
        .get("/api/products?search=LAPTOP&sort_by=name&sort_order=asc", None)
        .await;
    assert_eq!(names(&response.body), vec!["Desk Lamp", "Laptop Pro"]);

    let response = app
        .get("/api/products?min_price=cheap&sort_by=bogus", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total_items"], 4);
}

#[tokio::test]
async fn test_search_wildcards_are_literal() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for name in ["Desk Lamp", "50% Off Bundle", "snake_case Mug"] {
        app.create_product(&admin, json!({"name": name, "price": 5}))
            .await;
    }

    let response = app.get("/api/products?search=%25", None).await;
    assert_eq!(names(&response.body), vec!["50% Off Bundle"]);

    let response = app.get("/api/products?search=_", None).await;
    assert_eq!(names(&response.body), vec!["snake_case Mug"]);

    let response = app.get("/api/products?search=50%25%20off", None).await;
    assert_eq!(response.body["pagination"]["total_items"], 1);
}

#[tokio::test]
async fn test_categories_are_distinct_and_sorted() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for (name, category) in [
        ("A", Some("Books")),
        ("B", Some("Electronics")),
        ("C", Some("Books")),
        ("D", None),
        ("E", Some("")),
    ] {
        let mut body = json!({"name": name, "price": 1});
        if let Some(category) = category {
            body["category"] = json!(category);
        }
        app.create_product(&admin, body).await;
    }

    let response = app.get("/api/products/categories", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["categories"],
        json!(["Books", "Electronics"])
    );
    assert_eq!(response.body["data"]["count"], 2);
}

#[tokio::test]
async fn test_bulk_create_partial_success() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/api/products/bulk",
            Some(&admin),
            json!({
                "products": [
                    {"name": "Bulk Product 1", "price": 10.00},
                    {"name": "", "price": -1},
                    {"name": "Bulk Product 3", "price": 30.00}
                ]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["created"], 2);
    assert_eq!(response.body["data"]["products"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["data"]["errors"][0]["index"], 1);

    let response = app.get("/api/products", None).await;
    assert_eq!(response.body["pagination"]["total_items"], 2);
}

#[tokio::test]
async fn test_bulk_create_rejections() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, user) = app.register("regular").await;

    let batch = json!({"products": [{"name": "A", "price": 1}]});
    let response = app
        .post("/api/products/bulk", Some(&user), batch.clone())
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .post(
            "/api/products/bulk",
            Some(&admin),
            json!({"products": [{"price": 1}]}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["messages"],
        json!(["Item 0: Product name is required"])
    );

    let response = app
        .post("/api/products/bulk", Some(&admin), json!({"products": []}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "No products provided");

    let response = app
        .post("/api/products/bulk", Some(&admin), json!({"items": []}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Bad Request");
}

#[tokio::test]
async fn test_bulk_delete_reports_missing_ids() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let product = app
            .create_product(&admin, json!({"name": format!("Delete Me {i}"), "price": 10}))
            .await;
        ids.push(product["id"].as_i64().unwrap());
    }

    let mut requested = ids.clone();
    requested.push(424_242);

    let response = app
        .delete_json(
            "/api/products/bulk",
            Some(&admin),
            json!({"ids": requested}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["deleted"], json!(ids));
    assert_eq!(response.body["data"]["not_found"], json!([424_242]));

    let response = app.get("/api/products", None).await;
    assert_eq!(response.body["pagination"]["total_items"], 0);

    let response = app
        .delete_json("/api/products/bulk", Some(&admin), json!({"ids": []}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let app = spawn_app().await;

    let response = app.get("/api/products/abc", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Not Found");
}
