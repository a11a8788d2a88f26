use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),

    ValidationError(Vec<String>),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    MethodNotAllowed,

    Conflict(String),

    RateLimited { limit: u32, retry_after: u64 },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(msgs) => write!(f, "Validation error: {}", msgs.join("; ")),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::MethodNotAllowed => write!(f, "Method not allowed"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::RateLimited { retry_after, .. } => {
                write!(f, "Rate limited, retry after {}s", retry_after)
            }
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// The `error` field of the envelope.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::ValidationError(_) => "Validation Error",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not Found",
            ApiError::MethodNotAllowed => "Method Not Allowed",
            ApiError::Conflict(_) => "Conflict",
            ApiError::RateLimited { .. } => "Too Many Requests",
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => "Internal Server Error",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match self {
            ApiError::ValidationError(messages) => {
                ApiResponse::<()>::error(kind, messages.join("; ")).with_messages(messages)
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiResponse::error(kind, "A database error occurred")
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiResponse::error(kind, "An unexpected error occurred")
            }
            ApiError::MethodNotAllowed => ApiResponse::error(
                kind,
                "The method is not allowed for the requested URL",
            ),
            ApiError::RateLimited { limit, retry_after } => {
                let mut response = (
                    status,
                    Json(ApiResponse::<()>::error(
                        kind,
                        format!("Rate limit exceeded. Try again in {retry_after} seconds"),
                    )),
                )
                    .into_response();

                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
                headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
                return response;
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => ApiResponse::error(kind, msg),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
