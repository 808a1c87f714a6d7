//! # Patient Orchestrator
//!
//! Runs the side-effecting workflows around a patient record.
//!
//! ## Creation
//!
//! ```text
//! UniquenessCheck ──found──▶ Rejected(EmailConflict)
//!       │
//!    Persist ──duplicate──▶ Rejected(EmailConflict)
//!       │
//!   Provision ──ack──▶ Confirmed ─┐
//!       └──failure──▶ Pending ────┤
//!                                 ▼
//!                              Publish ──▶ Created
//! ```
//!
//! The uniqueness pre-check is a fast path; the store's atomic insert is the
//! authority. A provisioning failure never rolls the record back: the
//! patient stays persisted with provisioning `Pending` and can be retried
//! with [`Orchestrator::retry_provisioning`]. Publication is fire-and-forget
//! and happens whether or not provisioning succeeded.
//!
//! Every store call is bounded by the store timeout and the provisioning
//! call by the provisioning timeout. Store faults surface as
//! [`OrchestrationError`], never as a workflow outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pm_billing_client::{
    AccountProvisioner, BillingAccountRequest, FailureKind, ProvisioningOutcome,
};
use pm_core::{NewPatient, Patient, PatientChanges, PatientEvent, PatientId};
use pm_events::EventPublisher;

use crate::store::{PatientStore, StoreError};

/// Why a workflow stopped without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The email belongs to another live patient.
    EmailConflict,
    /// No patient with the given id.
    NotFound,
}

/// Billing provisioning state of a patient after a provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningStatus {
    /// The billing service acknowledged the account.
    Confirmed { account_id: String },
    /// Provisioning failed; the patient is kept and can be retried.
    Pending { reason: FailureKind },
}

/// Result of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    Created {
        patient: Patient,
        provisioning: ProvisioningStatus,
    },
    Rejected(Rejection),
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Patient),
    Rejected(Rejection),
}

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Patient),
    Rejected(Rejection),
}

/// Result of a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    Rejected(Rejection),
}

/// Result of a provisioning retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Provisioned(ProvisioningStatus),
    Rejected(Rejection),
}

/// Infrastructure faults. Not a workflow outcome.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// The store failed.
    #[error("patient store failed during {operation}: {source}")]
    Store {
        operation: &'static str,
        source: StoreError,
    },
    /// The store did not answer in time.
    #[error("patient store did not answer {operation} within {after:?}")]
    StoreTimeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Coordinates the store, the billing provisioner and the event publisher.
///
/// Stateless across requests; shared behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn PatientStore>,
    provisioner: Arc<dyn AccountProvisioner>,
    publisher: Arc<dyn EventPublisher>,
    store_timeout: Duration,
    provisioning_timeout: Duration,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators.
    pub fn new(
        store: Arc<dyn PatientStore>,
        provisioner: Arc<dyn AccountProvisioner>,
        publisher: Arc<dyn EventPublisher>,
        store_timeout: Duration,
        provisioning_timeout: Duration,
    ) -> Self {
        Self {
            store,
            provisioner,
            publisher,
            store_timeout,
            provisioning_timeout,
        }
    }

    /// Create a patient: check, persist, provision, publish.
    pub async fn create(&self, new: NewPatient) -> Result<CreationOutcome, OrchestrationError> {
        if self
            .bounded("exists_by_email", self.store.exists_by_email(&new.email))
            .await?
        {
            tracing::info!("patient creation rejected: email already registered");
            return Ok(CreationOutcome::Rejected(Rejection::EmailConflict));
        }

        let patient = Patient::from_new(PatientId::new(), new);
        match self.bounded_raw("insert", self.store.insert(&patient)).await? {
            Ok(()) => {}
            Err(StoreError::DuplicateEmail) => {
                tracing::info!(
                    patient_id = %patient.id,
                    "patient creation lost uniqueness race at insert"
                );
                return Ok(CreationOutcome::Rejected(Rejection::EmailConflict));
            }
            Err(source) => {
                return Err(OrchestrationError::Store {
                    operation: "insert",
                    source,
                })
            }
        }
        tracing::info!(patient_id = %patient.id, "patient persisted");

        let provisioning = self.provision(&patient).await;

        self.publisher.publish(PatientEvent::created(&patient));

        Ok(CreationOutcome::Created {
            patient,
            provisioning,
        })
    }

    /// Update name, email, address and date of birth of an existing patient.
    pub async fn update(
        &self,
        id: PatientId,
        changes: PatientChanges,
    ) -> Result<UpdateOutcome, OrchestrationError> {
        let Some(mut patient) = self.bounded("get", self.store.get(id)).await? else {
            return Ok(UpdateOutcome::Rejected(Rejection::NotFound));
        };

        if self
            .bounded(
                "exists_by_email_excluding",
                self.store.exists_by_email_excluding(&changes.email, id),
            )
            .await?
        {
            return Ok(UpdateOutcome::Rejected(Rejection::EmailConflict));
        }

        patient.apply(changes);
        match self.bounded_raw("update", self.store.update(&patient)).await? {
            Ok(true) => {
                tracing::info!(patient_id = %id, "patient updated");
                Ok(UpdateOutcome::Updated(patient))
            }
            Ok(false) => Ok(UpdateOutcome::Rejected(Rejection::NotFound)),
            Err(StoreError::DuplicateEmail) => Ok(UpdateOutcome::Rejected(Rejection::EmailConflict)),
            Err(source) => Err(OrchestrationError::Store {
                operation: "update",
                source,
            }),
        }
    }

    /// Fetch one patient.
    pub async fn get(&self, id: PatientId) -> Result<LookupOutcome, OrchestrationError> {
        Ok(match self.bounded("get", self.store.get(id)).await? {
            Some(patient) => LookupOutcome::Found(patient),
            None => LookupOutcome::Rejected(Rejection::NotFound),
        })
    }

    /// All live patients ordered by name, then id.
    pub async fn list(&self) -> Result<Vec<Patient>, OrchestrationError> {
        self.bounded("list", self.store.list()).await
    }

    /// Remove a patient.
    pub async fn delete(&self, id: PatientId) -> Result<DeletionOutcome, OrchestrationError> {
        if self.bounded("delete", self.store.delete(id)).await? {
            tracing::info!(patient_id = %id, "patient deleted");
            Ok(DeletionOutcome::Deleted)
        } else {
            Ok(DeletionOutcome::Rejected(Rejection::NotFound))
        }
    }

    /// Re-run billing provisioning for an existing patient. Does not publish.
    pub async fn retry_provisioning(
        &self,
        id: PatientId,
    ) -> Result<RetryOutcome, OrchestrationError> {
        let Some(patient) = self.bounded("get", self.store.get(id)).await? else {
            return Ok(RetryOutcome::Rejected(Rejection::NotFound));
        };
        Ok(RetryOutcome::Provisioned(self.provision(&patient).await))
    }

    async fn provision(&self, patient: &Patient) -> ProvisioningStatus {
        let request = BillingAccountRequest {
            patient_id: patient.id,
            name: patient.name.clone(),
            email: patient.email.clone(),
        };

        match tokio::time::timeout(
            self.provisioning_timeout,
            self.provisioner.create_account(&request),
        )
        .await
        {
            Ok(ProvisioningOutcome::Ack(account)) => ProvisioningStatus::Confirmed {
                account_id: account.account_id,
            },
            Ok(ProvisioningOutcome::Failure(failure)) => {
                tracing::warn!(
                    patient_id = %patient.id,
                    reason = %failure.kind,
                    "billing provisioning degraded, patient kept as pending"
                );
                ProvisioningStatus::Pending {
                    reason: failure.kind,
                }
            }
            Err(_) => {
                tracing::warn!(
                    patient_id = %patient.id,
                    timeout = ?self.provisioning_timeout,
                    "billing provisioning timed out, patient kept as pending"
                );
                ProvisioningStatus::Pending {
                    reason: FailureKind::Timeout,
                }
            }
        }
    }

    /// Run a store call under the store timeout, folding store errors.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, OrchestrationError> {
        self.bounded_raw(operation, call)
            .await?
            .map_err(|source| OrchestrationError::Store { operation, source })
    }

    /// Run a store call under the store timeout, leaving its result intact.
    async fn bounded_raw<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<Result<T, StoreError>, OrchestrationError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| {
                tracing::error!(operation, timeout = ?self.store_timeout, "patient store timed out");
                OrchestrationError::StoreTimeout {
                    operation,
                    after: self.store_timeout,
                }
            })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("store_timeout", &self.store_timeout)
            .field("provisioning_timeout", &self.provisioning_timeout)
            .finish_non_exhaustive()
    }
}
