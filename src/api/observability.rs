use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 64;
const UNMATCHED_ROUTE: &str = "unmatched";

/// Correlation id for one request, echoed back in `x-request-id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Reuses a caller-supplied id when it is a short token of
    /// `[A-Za-z0-9_-]`, otherwise generates a fresh UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            })
            .map_or_else(|| Self(Uuid::new_v4().to_string()), |id| Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `GET /metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    state.prometheus_handle.as_ref().map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                "Metrics not enabled or failed to initialize",
            )
                .into_response()
        },
        |handle| handle.render().into_response(),
    )
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.as_u16() == 429 {
        "rate_limited"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

/// Installed as a `route_layer`, where routing has already happened: copies
/// the matched route template onto the response for [`logging_middleware`].
pub async fn matched_route_middleware(req: Request, next: Next) -> Response {
    let matched = req.extensions().get::<MatchedPath>().cloned();
    let mut response = next.run(req).await;
    if let Some(matched) = matched {
        response.extensions_mut().insert(matched);
    }
    response
}

/// Route template for metric labels. Requests no route matched share one
/// label so arbitrary paths cannot mint new series.
fn route_label(response: &Response) -> String {
    response
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |mp| mp.as_str().to_string())
}

pub async fn logging_middleware(mut req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = RequestId::from_headers(req.headers());
    req.extensions_mut().insert(request_id.clone());

    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = tracing::field::Empty,
        user_id = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;
        let status = response.status();
        let elapsed = start.elapsed();

        let route = route_label(&response);
        tracing::Span::current().record("route", route.as_str());

        let labels = [
            ("method", method),
            ("route", route),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            warn!(
                status_code = status.as_u16(),
                duration_ms,
                outcome = outcome(status),
                "Request failed"
            );
        } else {
            info!(
                status_code = status.as_u16(),
                duration_ms,
                outcome = outcome(status),
                "Request finished"
            );
        }

        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
