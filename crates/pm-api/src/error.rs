//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps workflow rejections, validation failures and infrastructure faults
//! to HTTP status codes with a JSON body of the form
//! `{"error": {"code", "message", "details"?}}`.
//! Internal details never reach a response body; they are logged instead.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pm_core::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::orchestrator::{OrchestrationError, Rejection};
use crate::store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Field-level context for 409 and 422 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Field validation failed (422). Carries field → message.
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(BTreeMap<String, String>),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credential (401). The message is always generic.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict with an existing resource on the named field (409).
    #[error("conflict on {field}: {message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    /// A dependency is unavailable (503). Message is logged, not returned.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Conflict on the patient email.
    pub fn email_conflict() -> Self {
        Self::Conflict {
            field: "email",
            message: "a patient with this email already exists".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            Self::Unauthorized(_) => "Invalid or missing credentials".to_string(),
            Self::Conflict { message, .. } => message.clone(),
            Self::Validation(_) => "Request validation failed".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) | Self::ServiceUnavailable(_) => {
                tracing::error!(error = %self, "request failed");
            }
            Self::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "request unauthorized");
            }
            _ => {}
        }

        let details = match self {
            Self::Validation(fields) => serde_json::to_value(fields).ok(),
            Self::Conflict { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Collect field validation errors into a field → message map.
impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let mut fields = BTreeMap::new();
        for err in errors {
            fields
                .entry(err.field().to_string())
                .or_insert_with(|| err.to_string());
        }
        Self::Validation(fields)
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::EmailConflict => Self::email_conflict(),
            Rejection::NotFound => Self::NotFound("patient not found".into()),
        }
    }
}

impl From<OrchestrationError> for AppError {
    fn from(err: OrchestrationError) -> Self {
        match &err {
            OrchestrationError::StoreTimeout { .. }
            | OrchestrationError::Store {
                source: StoreError::Database(_),
                ..
            } => Self::ServiceUnavailable(err.to_string()),
            OrchestrationError::Store { .. } => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_codes_match_error_classes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation(BTreeMap::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::email_conflict(), StatusCode::CONFLICT, "CONFLICT"),
            (
                AppError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("test message"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn validation_errors_collect_into_field_map() {
        let err = AppError::from(vec![
            ValidationError::EmptyField { field: "name" },
            ValidationError::InvalidEmail("nope".into()),
        ]);
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("email"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn store_timeout_maps_to_unavailable() {
        let err = AppError::from(OrchestrationError::StoreTimeout {
            operation: "get",
            after: Duration::from_secs(5),
        });
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_conflict_names_field() {
        let (status, body) = response_parts(AppError::email_conflict()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.details, Some(serde_json::json!({"field": "email"})));
    }

    #[tokio::test]
    async fn into_response_validation_carries_field_map() {
        let err = AppError::from(vec![ValidationError::EmptyField { field: "address" }]);
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = body.error.details.unwrap();
        assert!(details["address"].as_str().unwrap().contains("address"));
    }

    #[tokio::test]
    async fn into_response_unauthorized_is_generic() {
        let (status, body) =
            response_parts(AppError::Unauthorized("signature mismatch".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.error.message.contains("signature"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_unavailable_hides_details() {
        let (status, body) =
            response_parts(AppError::ServiceUnavailable("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.error.message.contains("pool"));
    }
}
