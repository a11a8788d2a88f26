use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod extract;
mod observability;
mod params;
mod products;
mod rate_limit;
mod system;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AuthService, ProductService, RateLimiter, SystemService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.shared.rate_limiter
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn product_service(&self) -> &Arc<dyn ProductService> {
        &self.shared.product_service
    }

    #[must_use]
    pub fn system_service(&self) -> &Arc<dyn SystemService> {
        &self.shared.system_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_credential_router(state.clone()))
        .merge(create_authenticated_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .method_not_allowed_fallback(system::method_not_allowed)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_default,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::index))
        .route("/metrics", get(observability::get_metrics))
        .nest("/api", api_router)
        .route_layer(middleware::from_fn(
            observability::matched_route_middleware,
        ))
        .fallback(system::not_found)
        .method_not_allowed_fallback(system::method_not_allowed)
        .with_state(state)
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(system::api_info))
        .route("/health", get(system::health))
        .route("/products", get(products::list_products))
        .route("/products/categories", get(products::list_categories))
        .route("/products/{id}", get(products::get_product))
}

/// Registration and login carry their own, stricter budgets.
fn create_credential_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let register = Router::new()
        .route("/auth/register", post(auth::register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_register,
        ));

    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit::limit_login,
        ));

    register.merge(login)
}

fn create_authenticated_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(system::stats))
        .route("/auth/me", get(auth::me))
        .route("/auth/api-keys", get(auth::list_api_keys))
        .route("/auth/api-keys", post(auth::create_api_key))
        .route("/auth/api-keys/{id}", delete(auth::revoke_api_key))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/products", post(products::create_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_authenticated,
        ))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/products/bulk", post(products::bulk_create_products))
        .route("/products/bulk", delete(products::bulk_delete_products))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
