//! # Patient Domain Events
//!
//! The record handed to the message broker after a patient is created.
//! Serialized as camelCase JSON:
//!
//! ```json
//! {"patientId": "…", "name": "…", "email": "…", "eventType": "PATIENT_CREATED"}
//! ```

use serde::{Deserialize, Serialize};

use crate::identity::{Email, PatientId};
use crate::patient::Patient;

/// Event type tag carried on every [`PatientEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientEventType {
    /// A patient record was created.
    PatientCreated,
}

impl PatientEventType {
    /// Return the wire representation of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatientCreated => "PATIENT_CREATED",
        }
    }
}

impl std::fmt::Display for PatientEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event about one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEvent {
    /// Identity of the patient the event is about.
    pub patient_id: PatientId,
    /// Patient name at the time of the event.
    pub name: String,
    /// Patient email at the time of the event.
    pub email: Email,
    /// What happened.
    pub event_type: PatientEventType,
}

impl PatientEvent {
    /// Build the creation event for a freshly persisted patient.
    pub fn created(patient: &Patient) -> Self {
        Self {
            patient_id: patient.id,
            name: patient.name.clone(),
            email: patient.email.clone(),
            event_type: PatientEventType::PatientCreated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::NewPatient;

    #[test]
    fn created_event_serializes_with_wire_field_names() {
        let new = NewPatient::parse(
            "Jane Doe",
            "jane@example.com",
            "1 Main Street",
            "1990-04-12",
            Some("2024-01-02"),
        )
        .unwrap();
        let patient = Patient::from_new(PatientId::new(), new);
        let event = PatientEvent::created(&patient);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["patientId"], patient.id.to_string());
        assert_eq!(json["name"], "Jane Doe");
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["eventType"], "PATIENT_CREATED");
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn event_type_display_matches_wire_form() {
        let wire = serde_json::to_value(PatientEventType::PatientCreated).unwrap();
        assert_eq!(wire, PatientEventType::PatientCreated.as_str());
        assert_eq!(PatientEventType::PatientCreated.to_string(), "PATIENT_CREATED");
    }
}
