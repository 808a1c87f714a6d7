//! In-memory patient store.
//!
//! All operations are synchronous under a `parking_lot` lock that is never
//! held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use pm_core::{Email, Patient, PatientId};

use super::{PatientStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    patients: HashMap<PatientId, Patient>,
    by_email: HashMap<Email, PatientId>,
}

/// Process-local patient store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPatientStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryPatientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored patients.
    pub fn len(&self) -> usize {
        self.inner.read().patients.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn exists_by_email(&self, email: &Email) -> Result<bool, StoreError> {
        Ok(self.inner.read().by_email.contains_key(email))
    }

    async fn exists_by_email_excluding(
        &self,
        email: &Email,
        id: PatientId,
    ) -> Result<bool, StoreError> {
        Ok(matches!(self.inner.read().by_email.get(email), Some(owner) if *owner != id))
    }

    async fn insert(&self, patient: &Patient) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(&patient.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.by_email.insert(patient.email.clone(), patient.id);
        inner.patients.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn get(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        Ok(self.inner.read().patients.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Patient>, StoreError> {
        let mut patients: Vec<Patient> = self.inner.read().patients.values().cloned().collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(patients)
    }

    async fn update(&self, patient: &Patient) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        let Some(previous_email) = inner.patients.get(&patient.id).map(|p| p.email.clone()) else {
            return Ok(false);
        };
        if matches!(inner.by_email.get(&patient.email), Some(owner) if *owner != patient.id) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.by_email.remove(&previous_email);
        inner.by_email.insert(patient.email.clone(), patient.id);
        inner.patients.insert(patient.id, patient.clone());
        Ok(true)
    }

    async fn delete(&self, id: PatientId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        match inner.patients.remove(&id) {
            Some(patient) => {
                inner.by_email.remove(&patient.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_core::{NewPatient, PatientChanges};

    fn patient(name: &str, email: &str) -> Patient {
        let new = NewPatient::parse(name, email, "1 Main St", "1990-01-01", Some("2024-01-01"))
            .unwrap();
        Patient::from_new(PatientId::new(), new)
    }

    #[tokio::test]
    async fn insert_then_get_and_exists() {
        let store = InMemoryPatientStore::new();
        let p = patient("Jane", "jane@example.com");
        store.insert(&p).await.unwrap();

        assert_eq!(store.get(p.id).await.unwrap(), Some(p.clone()));
        assert!(store.exists_by_email(&p.email).await.unwrap());
        assert!(!store.exists_by_email_excluding(&p.email, p.id).await.unwrap());
        assert!(store
            .exists_by_email_excluding(&p.email, PatientId::new())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_atomically() {
        let store = InMemoryPatientStore::new();
        store.insert(&patient("Jane", "jane@example.com")).await.unwrap();
        let err = store
            .insert(&patient("Other Jane", "JANE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_name() {
        let store = InMemoryPatientStore::new();
        store.insert(&patient("Zed", "z@example.com")).await.unwrap();
        store.insert(&patient("Amy", "a@example.com")).await.unwrap();
        store.insert(&patient("Max", "m@example.com")).await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Max", "Zed"]);
    }

    #[tokio::test]
    async fn update_moves_email_index() {
        let store = InMemoryPatientStore::new();
        let mut p = patient("Jane", "jane@example.com");
        store.insert(&p).await.unwrap();

        p.apply(PatientChanges::parse("Jane", "jane.new@example.com", "2 High St", "1990-01-01").unwrap());
        assert!(store.update(&p).await.unwrap());

        assert!(!store
            .exists_by_email(&Email::new("jane@example.com").unwrap())
            .await
            .unwrap());
        // The old address is free again.
        store.insert(&patient("Other", "jane@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn update_to_taken_email_is_rejected() {
        let store = InMemoryPatientStore::new();
        let mut a = patient("A", "a@example.com");
        store.insert(&a).await.unwrap();
        store.insert(&patient("B", "b@example.com")).await.unwrap();

        a.email = Email::new("b@example.com").unwrap();
        assert!(matches!(
            store.update(&a).await,
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_id_report_false() {
        let store = InMemoryPatientStore::new();
        let p = patient("Jane", "jane@example.com");
        assert!(!store.update(&p).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_frees_email() {
        let store = InMemoryPatientStore::new();
        let p = patient("Jane", "jane@example.com");
        store.insert(&p).await.unwrap();
        assert!(store.delete(p.id).await.unwrap());
        assert!(store.is_empty());
        assert!(!store.exists_by_email(&p.email).await.unwrap());
    }
}
