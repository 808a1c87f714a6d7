//! The billing service client.

use std::time::Duration;

use url::Url;

use crate::config::{BillingConfig, ConfigError};
use crate::error::BillingError;
use crate::types::{
    BillingAccount, BillingAccountRequest, FailureKind, ProvisioningFailure, ProvisioningOutcome,
};

/// Path of the account creation endpoint, relative to the base URL.
const ACCOUNTS_PATH: &str = "billing/v1/accounts";

/// Join `ACCOUNTS_PATH` onto `base`, keeping any path prefix `base` carries.
fn accounts_url(base: &Url) -> Result<Url, ConfigError> {
    let raw = format!("{}/{}", base.as_str().trim_end_matches('/'), ACCOUNTS_PATH);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl("base_url".into(), e.to_string()))
}

/// Client for the billing service.
#[derive(Debug, Clone)]
pub struct BillingClient {
    http: reqwest::Client,
    accounts_url: Url,
    timeout: Duration,
}

impl BillingClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails if no base URL is configured or the HTTP client cannot be built.
    pub fn new(config: BillingConfig) -> Result<Self, BillingError> {
        let base_url = config.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let accounts_url = accounts_url(&base_url)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BillingError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            accounts_url,
            timeout,
        })
    }

    /// Resolved account creation endpoint.
    pub fn accounts_url(&self) -> &Url {
        &self.accounts_url
    }

    /// Configured bound on one provisioning call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open a billing account for a patient.
    ///
    /// Calls `POST {base_url}/billing/v1/accounts`. The whole call, retries
    /// included, is bounded by the configured timeout.
    pub async fn create_billing_account(
        &self,
        request: &BillingAccountRequest,
    ) -> ProvisioningOutcome {
        match tokio::time::timeout(self.timeout, self.send_create(request)).await {
            Ok(Ok(account)) => {
                tracing::info!(
                    patient_id = %request.patient_id,
                    account_id = %account.account_id,
                    "billing account created"
                );
                ProvisioningOutcome::Ack(account)
            }
            Ok(Err(e)) => {
                let failure = classify(e);
                tracing::warn!(
                    patient_id = %request.patient_id,
                    reason = %failure.kind,
                    detail = %failure.detail,
                    "billing account provisioning failed"
                );
                ProvisioningOutcome::Failure(failure)
            }
            Err(_) => {
                tracing::warn!(
                    patient_id = %request.patient_id,
                    timeout = ?self.timeout,
                    "billing account provisioning timed out"
                );
                ProvisioningOutcome::Failure(ProvisioningFailure::timeout(self.timeout))
            }
        }
    }

    async fn send_create(
        &self,
        request: &BillingAccountRequest,
    ) -> Result<BillingAccount, BillingError> {
        let endpoint = "POST /billing/v1/accounts";
        let resp = crate::retry::retry_send(|| {
            self.http
                .post(self.accounts_url.clone())
                .json(request)
                .send()
        })
            .await
            .map_err(|e| BillingError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BillingError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| BillingError::Deserialization {
            endpoint: endpoint.into(),
            status,
            source: e,
        })
    }
}

fn classify(error: BillingError) -> ProvisioningFailure {
    let kind = match &error {
        BillingError::Http { source, .. } if source.is_timeout() => FailureKind::Timeout,
        BillingError::Http { .. } | BillingError::Config(_) => FailureKind::Connection,
        BillingError::ApiError { status, .. } | BillingError::Deserialization { status, .. } => {
            FailureKind::Rejected { status: *status }
        }
    };
    ProvisioningFailure {
        kind,
        detail: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_url_keeps_base_path_prefix() {
        for (base, expected) in [
            ("http://billing:4001", "http://billing:4001/billing/v1/accounts"),
            ("http://billing:4001/", "http://billing:4001/billing/v1/accounts"),
            ("http://edge/api", "http://edge/api/billing/v1/accounts"),
            ("http://edge/api/", "http://edge/api/billing/v1/accounts"),
        ] {
            let base: Url = base.parse().unwrap();
            assert_eq!(accounts_url(&base).unwrap().as_str(), expected);
        }
    }
}
