//! Billing client error types.
//!
//! These stay inside the crate boundary except for client construction;
//! provisioning calls fold them into a
//! [`ProvisioningFailure`](crate::ProvisioningFailure).

/// Errors from billing service calls.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The billing service returned a non-2xx status.
    #[error("billing service {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// A 2xx response body could not be decoded.
    #[error("failed to deserialize response from {endpoint} ({status}): {source}")]
    Deserialization {
        endpoint: String,
        status: u16,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
