//! Billing client configuration.

use url::Url;

/// Configuration for the billing service connection.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Base URL of the billing service. `None` disables provisioning.
    pub base_url: Option<Url>,
    /// Upper bound on one provisioning call, retries included.
    pub timeout_secs: u64,
}

impl BillingConfig {
    /// Default bound on a provisioning call.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BILLING_SERVICE_URL` (optional)
    /// - `BILLING_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = match std::env::var("BILLING_SERVICE_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_url("BILLING_SERVICE_URL", &raw)?),
            _ => None,
        };
        Ok(Self {
            base_url,
            timeout_secs: std::env::var("BILLING_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Self::DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Configuration pointing at an explicit base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Some(parse_url("base_url", base_url)?),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        })
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("billing service URL is not configured")]
    MissingBaseUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_parses() {
        let cfg = BillingConfig::with_base_url("http://127.0.0.1:9001").unwrap();
        assert_eq!(cfg.base_url.unwrap().as_str(), "http://127.0.0.1:9001/");
        assert_eq!(cfg.timeout_secs, BillingConfig::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            BillingConfig::with_base_url("not a url"),
            Err(ConfigError::InvalidUrl(_, _))
        ));
    }
}
