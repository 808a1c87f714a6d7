//! # pm-billing-client: Billing Account Provisioning
//!
//! Typed access to the billing service's account creation endpoint:
//!
//! | Method | Path                   | Body                          |
//! |--------|------------------------|-------------------------------|
//! | POST   | `/billing/v1/accounts` | `{patientId, name, email}`    |
//!
//! A 2xx answer carrying `{accountId, status}` is an acknowledgement.
//! Everything else is folded into a [`ProvisioningFailure`], so callers never
//! see a raw transport error. The orchestrator depends only on the
//! [`AccountProvisioner`] seam.

pub mod client;
pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::BillingClient;
pub use config::{BillingConfig, ConfigError};
pub use error::BillingError;
pub use types::{
    BillingAccount, BillingAccountRequest, FailureKind, ProvisioningFailure, ProvisioningOutcome,
};

use async_trait::async_trait;

/// Creates billing accounts for newly registered patients.
#[async_trait]
pub trait AccountProvisioner: Send + Sync {
    /// Ask the billing side to open an account for the given patient.
    async fn create_account(&self, request: &BillingAccountRequest) -> ProvisioningOutcome;
}

#[async_trait]
impl AccountProvisioner for BillingClient {
    async fn create_account(&self, request: &BillingAccountRequest) -> ProvisioningOutcome {
        self.create_billing_account(request).await
    }
}

/// Provisioner used when no billing service is configured.
///
/// Every request fails with [`FailureKind::Connection`], which leaves the
/// patient in the pending provisioning state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfigured;

#[async_trait]
impl AccountProvisioner for NotConfigured {
    async fn create_account(&self, request: &BillingAccountRequest) -> ProvisioningOutcome {
        tracing::debug!(patient_id = %request.patient_id, "billing service not configured");
        ProvisioningOutcome::Failure(ProvisioningFailure {
            kind: FailureKind::Connection,
            detail: "billing service not configured".into(),
        })
    }
}
