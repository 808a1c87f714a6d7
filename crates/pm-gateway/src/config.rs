//! Gateway configuration, read once at startup.

use std::time::Duration;

use url::Url;

/// Configuration for the edge gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen port.
    pub port: u16,
    /// Base URL of the auth surface (`/login`, `/validate`).
    pub auth_url: Url,
    /// Base URL of the patient surface (`/patients`).
    pub patient_url: Url,
    /// Bound on one credential verification call.
    pub verify_timeout_secs: u64,
    /// Bound on one forwarded request.
    pub upstream_timeout_secs: u64,
}

impl GatewayConfig {
    pub const DEFAULT_PORT: u16 = 4004;
    pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 3;
    pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 4004)
    /// - `AUTH_SERVICE_URL` (required)
    /// - `PATIENT_SERVICE_URL` (required)
    /// - `VERIFY_TIMEOUT_SECS` (default: 3)
    /// - `UPSTREAM_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: env_parse("PORT", Self::DEFAULT_PORT)?,
            auth_url: required_url("AUTH_SERVICE_URL")?,
            patient_url: required_url("PATIENT_SERVICE_URL")?,
            verify_timeout_secs: env_parse(
                "VERIFY_TIMEOUT_SECS",
                Self::DEFAULT_VERIFY_TIMEOUT_SECS,
            )?,
            upstream_timeout_secs: env_parse(
                "UPSTREAM_TIMEOUT_SECS",
                Self::DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?,
        })
    }

    /// Configuration with default timeouts for the given upstreams.
    pub fn new(auth_url: Url, patient_url: Url) -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            auth_url,
            patient_url,
            verify_timeout_secs: Self::DEFAULT_VERIFY_TIMEOUT_SECS,
            upstream_timeout_secs: Self::DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn required_url(var: &'static str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))?;
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_upstream_is_reported_by_name() {
        let err = required_url("PM_GATEWAY_TEST_ABSENT_URL_1193").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PM_GATEWAY_TEST_ABSENT_URL_1193")));
    }

    #[test]
    fn malformed_upstream_is_rejected() {
        std::env::set_var("PM_GATEWAY_TEST_BAD_URL", "not a url");
        let result = required_url("PM_GATEWAY_TEST_BAD_URL");
        std::env::remove_var("PM_GATEWAY_TEST_BAD_URL");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn new_uses_default_timeouts() {
        let config = GatewayConfig::new(
            "http://auth:4005".parse().unwrap(),
            "http://patients:4000".parse().unwrap(),
        );
        assert_eq!(config.verify_timeout(), Duration::from_secs(3));
        assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
        assert_eq!(config.port, 4004);
    }
}
