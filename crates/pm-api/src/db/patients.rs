//! Patient persistence on the `patients` table.
//!
//! Uniqueness of `email` is enforced by the `patients_email_key` index;
//! SQLSTATE 23505 surfaces as [`StoreError::DuplicateEmail`].

use async_trait::async_trait;
use chrono::NaiveDate;
use pm_core::{Email, Patient, PatientId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{PatientStore, StoreError};

/// Postgres-backed patient store.
#[derive(Debug, Clone)]
pub struct PgPatientStore {
    pool: PgPool,
}

impl PgPatientStore {
    /// Wrap a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: Uuid,
    name: String,
    email: String,
    address: String,
    date_of_birth: NaiveDate,
    registered_date: NaiveDate,
}

impl PatientRow {
    fn into_patient(self) -> Result<Patient, StoreError> {
        let email = Email::new(self.email).map_err(|e| StoreError::Corrupt {
            id: self.id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Patient {
            id: PatientId::from_uuid(self.id),
            name: self.name,
            email,
            address: self.address,
            date_of_birth: self.date_of_birth,
            registered_date: self.registered_date,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, email, address, date_of_birth, registered_date FROM patients";

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM patients WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_email_excluding(
        &self,
        email: &Email,
        id: PatientId,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM patients WHERE email = $1 AND id <> $2)",
        )
        .bind(email.as_str())
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, patient: &Patient) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO patients (id, name, email, address, date_of_birth, registered_date)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(patient.id.as_uuid())
        .bind(&patient.name)
        .bind(patient.email.as_str())
        .bind(&patient.address)
        .bind(patient.date_of_birth)
        .bind(patient.registered_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        let row = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(PatientRow::into_patient).transpose()
    }

    async fn list(&self) -> Result<Vec<Patient>, StoreError> {
        let rows = sqlx::query_as::<_, PatientRow>(&format!("{SELECT_COLUMNS} ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PatientRow::into_patient).collect()
    }

    async fn update(&self, patient: &Patient) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE patients SET name = $2, email = $3, address = $4, date_of_birth = $5
             WHERE id = $1",
        )
        .bind(patient.id.as_uuid())
        .bind(&patient.name)
        .bind(patient.email.as_str())
        .bind(&patient.address)
        .bind(patient.date_of_birth)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: PatientId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
