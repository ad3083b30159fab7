//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::store::StoreError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Store failure: {0}")]
    Store(StoreError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Lookup and uniqueness outcomes keep their kind; everything else is a store failure.
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => AppError::NotFound { entity, id },
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<crate::domain::MeasureError> for AppError {
    fn from(e: crate::domain::MeasureError) -> Self {
        AppError::Domain(e.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::NotFound { entity, id } => {
                (StatusCode::NOT_FOUND, "not_found", Some(format!("{} {}", entity, id)))
            }

            // 409 Conflict
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, "conflict", Some(msg.clone()))
            }

            // Blank names never reach the stores
            AppError::Domain(crate::domain::DomainError::BlankName) => {
                (StatusCode::BAD_REQUEST, "blank_name", None)
            }

            // Remaining domain errors are validation failures
            AppError::Domain(ref domain_err) => {
                use crate::domain::DomainError;
                let code = match domain_err {
                    DomainError::MetricMismatch { .. } => "metric_mismatch",
                    DomainError::ZeroQuantity => "zero_quantity",
                    DomainError::InvalidMeasure(_) => "invalid_measure",
                    DomainError::PriceOverflow(_) => "price_overflow",
                    DomainError::BlankName => "blank_name",
                };
                (StatusCode::UNPROCESSABLE_ENTITY, code, Some(domain_err.to_string()))
            }

            // 5xx
            AppError::Store(StoreError::Timeout(d)) => {
                tracing::error!(timeout = ?d, "Store timeout");
                (StatusCode::SERVICE_UNAVAILABLE, "store_timeout", None)
            }
            AppError::Store(e) => {
                tracing::error!("Store failure: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_failure", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use std::time::Duration;

    #[test]
    fn test_store_not_found_keeps_kind() {
        let id = Uuid::new_v4();
        let err: AppError = StoreError::not_found("Budget", id).into();
        assert!(matches!(err, AppError::NotFound { entity: "Budget", id: got } if got == id));
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::not_found("Material", Uuid::nil()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::Domain(DomainError::ZeroQuantity), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Domain(DomainError::BlankName), StatusCode::BAD_REQUEST),
            (StoreError::Timeout(Duration::from_secs(15)).into(), StatusCode::SERVICE_UNAVAILABLE),
            (StoreError::InvalidData("bad".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
