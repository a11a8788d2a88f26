#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use catalog_api::config::Config;
use catalog_api::db::Store;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adminpass123";
pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Store,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Fresh temp-file database, fast Argon2 parameters, rate limiting off and a
/// bootstrapped admin account.
pub fn test_config() -> Config {
    let db_path = std::env::temp_dir().join(format!("catalog-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}?mode=rwc", db_path.display());
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.rate_limit.enabled = false;
    config.bootstrap.admin_username = ADMIN_USERNAME.to_string();
    config.bootstrap.admin_email = "admin@example.com".to_string();
    config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = Store::with_pool_options(&config.general.database_path, 5, 1)
        .await
        .expect("Failed to open test database");
    let router = catalog_api::build_app(config, store.clone())
        .await
        .expect("Failed to build app");
    TestApp { router, store }
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(build_request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(build_request(Method::POST, uri, token, Some(&body)))
            .await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(build_request(Method::PUT, uri, token, Some(&body)))
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(build_request(Method::DELETE, uri, token, None))
            .await
    }

    pub async fn delete_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(build_request(Method::DELETE, uri, token, Some(&body)))
            .await
    }

    pub async fn send_with_api_key(&self, uri: &str, key: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .header("X-API-Key", key)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Registers a regular user and returns `(id, token)`.
    pub async fn register(&self, username: &str) -> (i64, String) {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "pw123456",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        (
            response.body["data"]["user"]["id"].as_i64().unwrap(),
            response.body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_product(&self, token: &str, body: Value) -> Value {
        let response = self.post("/api/products", Some(token), body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"].clone()
    }
}
