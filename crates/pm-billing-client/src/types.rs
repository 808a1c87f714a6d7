//! Wire types and the provisioning outcome.

use pm_core::{Email, PatientId};
use serde::{Deserialize, Serialize};

/// Request body for `POST /billing/v1/accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAccountRequest {
    pub patient_id: PatientId,
    pub name: String,
    pub email: Email,
}

/// Billing account as acknowledged by the billing service.
///
/// Unknown response fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAccount {
    pub account_id: String,
    #[serde(default)]
    pub status: String,
}

/// Classification of a failed provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The billing service could not be reached.
    Connection,
    /// The billing service answered, but not with an acknowledgement.
    Rejected { status: u16 },
    /// The call did not complete within its bound.
    Timeout,
}

impl FailureKind {
    /// Stable label used in responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "CONNECTION",
            Self::Rejected { .. } => "REJECTED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed provisioning call. `detail` is diagnostic text for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ProvisioningFailure {
    /// A timeout failure with the given bound in the detail.
    pub fn timeout(after: std::time::Duration) -> Self {
        Self {
            kind: FailureKind::Timeout,
            detail: format!("no answer within {after:?}"),
        }
    }
}

/// Result of asking for a billing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Ack(BillingAccount),
    Failure(ProvisioningFailure),
}
