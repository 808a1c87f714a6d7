//! Event publisher implementations.
//!
//! The broker is reached through its REST ingress: one record per event,
//! keyed by patient id so every event about one patient lands on the same
//! partition.
//!
//! ```json
//! {"records": [{"key": "<patientId>", "value": {"patientId": "...", "eventType": "PATIENT_CREATED", ...}}]}
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pm_core::PatientEvent;
use serde::Serialize;

use crate::config::BrokerConfig;

/// Hands patient events to the broker.
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Returns immediately and never fails.
    fn publish(&self, event: PatientEvent);
}

/// Errors from one delivery attempt. Logged, never propagated past
/// [`EventPublisher::publish`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP error delivering to {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("broker returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("delivery did not complete within {0:?}")]
    Timeout(Duration),
    #[error("broker publisher requires a broker URL")]
    NotConfigured,
}

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: [ProduceRecord<'a>; 1],
}

#[derive(Serialize)]
struct ProduceRecord<'a> {
    key: String,
    value: &'a PatientEvent,
}

/// Publishes to the broker's REST ingress on a background task.
#[derive(Debug, Clone)]
pub struct HttpBrokerPublisher {
    http: reqwest::Client,
    endpoint: url::Url,
    timeout: Duration,
}

impl HttpBrokerPublisher {
    /// Build a publisher targeting `{url}/topics/{topic}`.
    pub fn new(config: &BrokerConfig) -> Result<Self, PublishError> {
        let base = config.url.as_ref().ok_or(PublishError::NotConfigured)?;
        let endpoint_str = format!(
            "{}/topics/{}",
            base.as_str().trim_end_matches('/'),
            config.topic
        );
        let endpoint = url::Url::parse(&endpoint_str).map_err(|_| PublishError::NotConfigured)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Http {
                endpoint: endpoint_str,
                source: e,
            })?;

        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    /// The resolved topic endpoint.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Deliver one event and wait for the broker's answer. Exactly one
    /// attempt, bounded by the configured timeout.
    pub async fn deliver(&self, event: &PatientEvent) -> Result<(), PublishError> {
        let body = serde_json::to_vec(&ProduceRequest {
            records: [ProduceRecord {
                key: event.patient_id.to_string(),
                value: event,
            }],
        })?;

        let send = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        let resp = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| PublishError::Timeout(self.timeout))?
            .map_err(|e| PublishError::Http {
                endpoint: self.endpoint.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Rejected { status, body });
        }
        Ok(())
    }
}

impl EventPublisher for HttpBrokerPublisher {
    fn publish(&self, event: PatientEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                patient_id = %event.patient_id,
                "no async runtime available, dropping event"
            );
            return;
        };

        let publisher = self.clone();
        runtime.spawn(async move {
            match publisher.deliver(&event).await {
                Ok(()) => tracing::debug!(
                    patient_id = %event.patient_id,
                    event_type = %event.event_type,
                    "event published"
                ),
                Err(e) => tracing::error!(
                    patient_id = %event.patient_id,
                    event_type = %event.event_type,
                    error = %e,
                    "event publication failed"
                ),
            }
        });
    }
}

/// Records events in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPublisher {
    events: Arc<Mutex<Vec<PatientEvent>>>,
}

impl InMemoryPublisher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event published so far, oldest first.
    pub fn events(&self) -> Vec<PatientEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher for InMemoryPublisher {
    fn publish(&self, event: PatientEvent) {
        self.events.lock().push(event);
    }
}

/// Logs events instead of delivering them. Used when no broker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPublisher;

impl EventPublisher for LoggingPublisher {
    fn publish(&self, event: PatientEvent) {
        tracing::info!(
            patient_id = %event.patient_id,
            event_type = %event.event_type,
            "broker not configured, event logged only"
        );
    }
}
