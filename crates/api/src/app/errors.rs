use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use relieftrack_core::DomainError;
use relieftrack_infra::{ServiceError, StoreError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
        ServiceError::Serialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "serialize_error", msg)
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::EmptyLineItems => {
            json_error(StatusCode::BAD_REQUEST, "empty_line_items", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::ItemNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "item_not_found", message)
        }
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
        DomainError::ItemUnavailable(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "item_unavailable", message)
        }
        DomainError::InvalidTransition { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", message)
        }
        DomainError::InUse(_) => json_error(StatusCode::CONFLICT, "in_use", message),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        StoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StoreError::Concurrency(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        StoreError::Duplicate(_) => json_error(StatusCode::CONFLICT, "duplicate", message),
        StoreError::OrganizationIsolation(_)
        | StoreError::InvalidBatch(_)
        | StoreError::Unavailable(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path identifier; 400 `invalid_id` when malformed.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
