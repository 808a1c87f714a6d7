//! # Gateway Error Types
//!
//! Every rejection the gateway itself produces carries the same body shape
//! as the services behind it: `{"error": {"code", "message"}}`. Upstream
//! and verifier detail is logged and never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Errors produced at the edge.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Credential absent, malformed, refused, or unverifiable (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request body over the forwarding limit or unreadable (413).
    #[error("request body rejected: {0}")]
    PayloadTooLarge(String),

    /// Upstream could not be reached or answered garbage (502).
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Upstream did not answer in time (504).
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),

    /// HTTP client could not be constructed (500).
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl GatewayError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            Self::GatewayTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
            Self::Client(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Unauthorized(_) => "Invalid or missing credentials",
            Self::PayloadTooLarge(_) => "Request body too large",
            Self::BadGateway(_) => "Upstream service unavailable",
            Self::GatewayTimeout(_) => "Upstream service timed out",
            Self::Client(_) => "An internal error occurred",
        };

        match &self {
            Self::Unauthorized(reason) => tracing::warn!(reason = %reason, "request rejected at edge"),
            Self::PayloadTooLarge(_) => {}
            _ => tracing::error!(error = %self, "forwarding failed"),
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn status_codes_match_error_classes() {
        assert_eq!(
            GatewayError::Unauthorized("x".into()).status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::BadGateway("x".into()).status_and_code().0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::GatewayTimeout("x".into()).status_and_code().0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::PayloadTooLarge("x".into()).status_and_code().0,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn response_hides_internal_reason() {
        let response =
            GatewayError::BadGateway("connection refused to 10.0.0.7:4000".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "BAD_GATEWAY");
        assert!(!body.error.message.contains("10.0.0.7"));
    }
}
