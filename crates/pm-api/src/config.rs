//! # Service Configuration
//!
//! Parsed once at startup from the environment. Secrets are held in
//! zeroizing or redacted types and never appear in `Debug` output.

use std::sync::Arc;

use pm_auth::{AuthError, SigningSecret, DEFAULT_TOKEN_VALIDITY_SECS};
use pm_billing_client::BillingConfig;
use pm_events::BrokerConfig;
use zeroize::Zeroizing;

/// Development login seeded into the user store at startup.
#[derive(Clone)]
pub struct SeedUser {
    pub email: String,
    pub password: Zeroizing<String>,
    pub role: String,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Configuration for the patient API service.
#[derive(Clone)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Shared credential signing secret.
    pub signing_secret: Arc<SigningSecret>,
    /// Lifetime of issued credentials in seconds.
    pub token_validity_secs: i64,
    /// Bound on each patient store call.
    pub store_timeout_secs: u64,
    /// Bound on the provisioning step of a creation.
    pub provisioning_timeout_secs: u64,
    /// Postgres connection URL. `None` selects in-memory stores.
    pub database_url: Option<String>,
    /// Optional development login.
    pub seed_user: Option<SeedUser>,
    /// Billing service connection.
    pub billing: BillingConfig,
    /// Broker connection.
    pub broker: BrokerConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("signing_secret", &self.signing_secret)
            .field("token_validity_secs", &self.token_validity_secs)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("provisioning_timeout_secs", &self.provisioning_timeout_secs)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("seed_user", &self.seed_user)
            .field("billing", &self.billing)
            .field("broker", &self.broker)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 4000)
    /// - `JWT_SECRET` (required, base64, at least 32 decoded bytes)
    /// - `TOKEN_VALIDITY_SECS` (default: 36000)
    /// - `STORE_TIMEOUT_SECS` (default: 5)
    /// - `PROVISIONING_TIMEOUT_SECS` (default: 5)
    /// - `DATABASE_URL` (optional)
    /// - `SEED_USER_EMAIL`, `SEED_USER_PASSWORD`, `SEED_USER_ROLE` (optional, together)
    /// - billing and broker variables, see [`BillingConfig::from_env`] and
    ///   [`BrokerConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_secret = Zeroizing::new(
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingSecret)?,
        );
        let signing_secret = Arc::new(SigningSecret::from_base64(&raw_secret)?);

        Ok(Self {
            port: env_parse("PORT", 4000)?,
            signing_secret,
            token_validity_secs: env_parse("TOKEN_VALIDITY_SECS", DEFAULT_TOKEN_VALIDITY_SECS)?,
            store_timeout_secs: env_parse("STORE_TIMEOUT_SECS", 5)?,
            provisioning_timeout_secs: env_parse("PROVISIONING_TIMEOUT_SECS", 5)?,
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            seed_user: seed_user_from_env()?,
            billing: BillingConfig::from_env()?,
            broker: BrokerConfig::from_env()?,
        })
    }
}

fn seed_user_from_env() -> Result<Option<SeedUser>, ConfigError> {
    let email = std::env::var("SEED_USER_EMAIL").ok();
    let password = std::env::var("SEED_USER_PASSWORD").ok().map(Zeroizing::new);
    match (email, password) {
        (Some(email), Some(password)) => Ok(Some(SeedUser {
            email,
            password,
            role: std::env::var("SEED_USER_ROLE").unwrap_or_else(|_| "ADMIN".to_string()),
        })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::IncompleteSeedUser),
    }
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
    #[error("JWT_SECRET environment variable is required")]
    MissingSecret,
    #[error("invalid JWT_SECRET: {0}")]
    InvalidSecret(#[from] AuthError),
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("SEED_USER_EMAIL and SEED_USER_PASSWORD must be set together")]
    IncompleteSeedUser,
    #[error("billing configuration: {0}")]
    Billing(#[from] pm_billing_client::ConfigError),
    #[error("broker configuration: {0}")]
    Broker(#[from] pm_events::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_uses_default_when_var_absent() {
        assert_eq!(env_parse("PM_API_NONEXISTENT_VAR_4821", 42u64).unwrap(), 42);
    }

    #[test]
    fn env_parse_rejects_garbage() {
        std::env::set_var("PM_API_TEST_BAD_NUMBER", "forty");
        let result = env_parse::<u64>("PM_API_TEST_BAD_NUMBER", 1);
        std::env::remove_var("PM_API_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            port: 4000,
            signing_secret: Arc::new(SigningSecret::from_bytes(vec![1u8; 32]).unwrap()),
            token_validity_secs: 60,
            store_timeout_secs: 5,
            provisioning_timeout_secs: 5,
            database_url: Some("postgres://user:hunter2@db/pm".into()),
            seed_user: Some(SeedUser {
                email: "admin@clinic.org".into(),
                password: Zeroizing::new("s3cret-pass".into()),
                role: "ADMIN".into(),
            }),
            billing: BillingConfig {
                base_url: None,
                timeout_secs: 5,
            },
            broker: BrokerConfig {
                url: None,
                topic: "patient".into(),
                timeout_secs: 5,
            },
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("s3cret-pass"));
        assert!(debug.contains("REDACTED"));
    }
}
