use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::{RateDecision, RateScope};

pub async fn limit_default(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, RateScope::Default, request, next).await
}

pub async fn limit_register(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, RateScope::Register, request, next).await
}

pub async fn limit_login(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, RateScope::Login, request, next).await
}

async fn enforce(
    state: &AppState,
    scope: RateScope,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limiter = state.rate_limiter();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok());
    let client = limiter.client_key(peer, forwarded_for);

    let Some(decision) = limiter.check(scope, &client) else {
        return Ok(next.run(request).await);
    };

    if !decision.allowed {
        tracing::warn!(
            scope = scope.as_str(),
            client = %client,
            retry_after = decision.retry_after_secs,
            "Rate limit exceeded"
        );
        metrics::counter!("rate_limit_rejections_total", "scope" => scope.as_str()).increment(1);
        return Err(ApiError::RateLimited {
            limit: decision.limit,
            retry_after: decision.retry_after_secs,
        });
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), decision);
    Ok(response)
}

/// The innermost (most specific) policy sets the headers; outer layers do not
/// overwrite them.
fn apply_headers(headers: &mut HeaderMap, decision: RateDecision) {
    headers
        .entry("x-ratelimit-limit")
        .or_insert_with(|| HeaderValue::from(decision.limit));
    headers
        .entry("x-ratelimit-remaining")
        .or_insert_with(|| HeaderValue::from(decision.remaining));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_headers_keeps_inner_values() {
        let mut headers = HeaderMap::new();
        apply_headers(
            &mut headers,
            RateDecision {
                allowed: true,
                limit: 5,
                remaining: 4,
                retry_after_secs: 0,
            },
        );
        apply_headers(
            &mut headers,
            RateDecision {
                allowed: true,
                limit: 1000,
                remaining: 999,
                retry_after_secs: 0,
            },
        );
        assert_eq!(headers["x-ratelimit-limit"], "5");
        assert_eq!(headers["x-ratelimit-remaining"], "4");
    }
}
