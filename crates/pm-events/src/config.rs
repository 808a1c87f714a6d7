//! Broker configuration.

use url::Url;

/// Configuration for the broker connection.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// REST ingress of the broker. `None` means events are only logged.
    pub url: Option<Url>,
    /// Topic receiving patient events.
    pub topic: String,
    /// Bound on a single delivery attempt.
    pub timeout_secs: u64,
}

impl BrokerConfig {
    /// Default topic name.
    pub const DEFAULT_TOPIC: &'static str = "patient";
    /// Default delivery bound.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BROKER_URL` (optional)
    /// - `BROKER_TOPIC` (default: `patient`)
    /// - `BROKER_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = match std::env::var("BROKER_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim())
                    .map_err(|e| ConfigError::InvalidUrl("BROKER_URL".into(), e.to_string()))?,
            ),
            _ => None,
        };
        let topic = std::env::var("BROKER_TOPIC")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_TOPIC.to_string());
        validate_topic(&topic)?;

        Ok(Self {
            url,
            topic,
            timeout_secs: std::env::var("BROKER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Self::DEFAULT_TIMEOUT_SECS),
        })
    }
}

fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    let ok = topic
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidTopic(topic.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid topic name {0:?}: use letters, digits, '.', '_' or '-'")]
    InvalidTopic(String),
}
