//! # Patient Record
//!
//! The primary entity of the stack. A [`Patient`] is owned by the store;
//! request handlers and the orchestrator only ever hold transient copies.
//!
//! Inbound data arrives as raw strings. [`NewPatient::parse`] and
//! [`PatientChanges::parse`] validate every field and report *all* failures at
//! once, so a client sees the complete list of problems in one round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{Email, PatientId};

/// Maximum length of a patient name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a postal address, in characters.
pub const MAX_ADDRESS_LEN: usize = 500;

/// A persisted patient.
///
/// Serialized in camelCase (`dateOfBirth`, `registeredDate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Immutable identity, assigned on creation.
    pub id: PatientId,
    /// Full name.
    pub name: String,
    /// Contact email, unique across all live patients.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Date the patient was registered with the practice.
    pub registered_date: NaiveDate,
}

impl Patient {
    /// Materialize a new patient under a freshly assigned identity.
    pub fn from_new(id: PatientId, new: NewPatient) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            address: new.address,
            date_of_birth: new.date_of_birth,
            registered_date: new.registered_date,
        }
    }

    /// Apply an update. Identity and registration date never change.
    pub fn apply(&mut self, changes: PatientChanges) {
        self.name = changes.name;
        self.email = changes.email;
        self.address = changes.address;
        self.date_of_birth = changes.date_of_birth;
    }
}

/// Validated input for creating a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Registration date.
    pub registered_date: NaiveDate,
}

impl NewPatient {
    /// Validate raw creation fields.
    ///
    /// `registered_date` is required on creation only; a `None` is reported
    /// as an empty field.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn parse(
        name: &str,
        email: &str,
        address: &str,
        date_of_birth: &str,
        registered_date: Option<&str>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = collect(&mut errors, validate_text("name", name, MAX_NAME_LEN));
        let email = collect(&mut errors, Email::new(email));
        let address = collect(
            &mut errors,
            validate_text("address", address, MAX_ADDRESS_LEN),
        );
        let date_of_birth = collect(&mut errors, parse_date("dateOfBirth", date_of_birth));
        let registered_date = collect(
            &mut errors,
            registered_date
                .ok_or(ValidationError::EmptyField {
                    field: "registeredDate",
                })
                .and_then(|value| parse_date("registeredDate", value)),
        );

        match (name, email, address, date_of_birth, registered_date) {
            (Some(name), Some(email), Some(address), Some(date_of_birth), Some(registered_date))
                if errors.is_empty() =>
            {
                Ok(Self {
                    name,
                    email,
                    address,
                    date_of_birth,
                    registered_date,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Validated input for updating a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientChanges {
    /// Replacement name.
    pub name: String,
    /// Replacement email.
    pub email: Email,
    /// Replacement address.
    pub address: String,
    /// Replacement date of birth.
    pub date_of_birth: NaiveDate,
}

impl PatientChanges {
    /// Validate raw update fields.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn parse(
        name: &str,
        email: &str,
        address: &str,
        date_of_birth: &str,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = collect(&mut errors, validate_text("name", name, MAX_NAME_LEN));
        let email = collect(&mut errors, Email::new(email));
        let address = collect(
            &mut errors,
            validate_text("address", address, MAX_ADDRESS_LEN),
        );
        let date_of_birth = collect(&mut errors, parse_date("dateOfBirth", date_of_birth));

        match (name, email, address, date_of_birth) {
            (Some(name), Some(email), Some(address), Some(date_of_birth)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    email,
                    address,
                    date_of_birth,
                })
            }
            _ => Err(errors),
        }
    }
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

fn validate_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new() -> NewPatient {
        NewPatient::parse(
            "Jane Doe",
            "jane@example.com",
            "1 Main Street",
            "1990-04-12",
            Some("2024-01-02"),
        )
        .unwrap()
    }

    #[test]
    fn parse_accepts_valid_input_and_trims() {
        let new = NewPatient::parse(
            "  Jane Doe ",
            "Jane@Example.com",
            " 1 Main Street ",
            "1990-04-12",
            Some("2024-01-02"),
        )
        .unwrap();
        assert_eq!(new.name, "Jane Doe");
        assert_eq!(new.email.as_str(), "jane@example.com");
        assert_eq!(new.address, "1 Main Street");
        assert_eq!(new.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 12).unwrap());
    }

    #[test]
    fn parse_reports_every_failing_field() {
        let errors = NewPatient::parse("", "nope", "", "12/04/1990", None).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            fields,
            vec!["name", "email", "address", "dateOfBirth", "registeredDate"]
        );
    }

    #[test]
    fn parse_rejects_overlong_name() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let errors = NewPatient::parse(
            &long,
            "a@b.co",
            "addr",
            "1990-01-01",
            Some("2020-01-01"),
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN
            }]
        );
    }

    #[test]
    fn patient_serializes_in_camel_case() {
        let patient = Patient::from_new(PatientId::new(), valid_new());
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["dateOfBirth"], "1990-04-12");
        assert_eq!(json["registeredDate"], "2024-01-02");
        assert!(json.get("date_of_birth").is_none());
    }

    #[test]
    fn changes_do_not_require_registered_date() {
        assert!(PatientChanges::parse("Jane", "jane@example.com", "addr", "1990-01-01").is_ok());
    }

    #[test]
    fn apply_keeps_identity_and_registration() {
        let id = PatientId::new();
        let mut patient = Patient::from_new(id, valid_new());
        let registered = patient.registered_date;

        let changes =
            PatientChanges::parse("Jane Smith", "jane.smith@example.com", "2 High St", "1990-04-13")
                .unwrap();
        patient.apply(changes);

        assert_eq!(patient.id, id);
        assert_eq!(patient.registered_date, registered);
        assert_eq!(patient.name, "Jane Smith");
        assert_eq!(patient.email.as_str(), "jane.smith@example.com");
    }
}
