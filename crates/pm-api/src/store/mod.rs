//! # Patient Store
//!
//! The store owns patient records and is the single authority for email
//! uniqueness. Implementations must reject a second live record with the
//! same email atomically, so a check-then-insert race between two requests
//! ends with exactly one row and one [`StoreError::DuplicateEmail`].
//!
//! - [`InMemoryPatientStore`]: id map and email index under one write lock.
//! - [`crate::db::patients::PgPatientStore`]: Postgres unique index.

pub mod memory;

pub use memory::InMemoryPatientStore;

use async_trait::async_trait;
use pm_core::{Email, Patient, PatientId};

/// Persistence seam for patient records.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Whether any live patient uses `email`.
    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError>;

    /// Whether a live patient other than `id` uses `email`.
    async fn exists_by_email_excluding(
        &self,
        email: &Email,
        id: PatientId,
    ) -> Result<bool, StoreError>;

    /// Persist a new patient.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    async fn insert(&self, patient: &Patient) -> Result<(), StoreError>;

    /// Fetch one patient.
    async fn get(&self, id: PatientId) -> Result<Option<Patient>, StoreError>;

    /// All live patients ordered by name, then id.
    async fn list(&self) -> Result<Vec<Patient>, StoreError>;

    /// Replace an existing patient. Returns `false` if `patient.id` is unknown.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the new email belongs to
    /// another patient.
    async fn update(&self, patient: &Patient) -> Result<bool, StoreError>;

    /// Remove a patient. Returns `false` if `id` is unknown.
    async fn delete(&self, id: PatientId) -> Result<bool, StoreError>;
}

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The email is already used by another live patient.
    #[error("email is already registered")]
    DuplicateEmail,

    /// A stored row could not be mapped back to a patient.
    #[error("corrupt patient record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Database error.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::DuplicateEmail,
            _ => Self::Database(err),
        }
    }
}
