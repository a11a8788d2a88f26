//! Extractor helpers. Handlers take `Result<Json<T>, JsonRejection>` (and the
//! path/query equivalents) and unwrap it through these so malformed input
//! becomes an enveloped error instead of axum's plain-text rejection.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;
use crate::validation::Fields;

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| ApiError::BadRequest(err.body_text()))
}

/// Extracts a body that must be a JSON object. Field-level rules are checked
/// later by the validator, which needs the raw map.
pub fn extract_fields(result: Result<Json<Value>, JsonRejection>) -> Result<Fields, ApiError> {
    match extract_json(result)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// Like [`extract_json`] but an empty body yields `T::default()`.
pub fn extract_optional_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| ApiError::BadRequest(err.body_text()))
}

/// Non-numeric ids cannot name a resource, so they are reported as missing.
pub fn extract_id(result: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    result
        .map(|Path(id)| id)
        .map_err(|_| ApiError::NotFound("The requested resource was not found".to_string()))
}
