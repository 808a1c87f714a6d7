//! # Error Hierarchy
//!
//! Validation errors for the domain primitives. Each variant carries the
//! rejected input so that a caller can report it back per field.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and patient fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is not of the form `local@domain`.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// A required text field is empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// The field name as it appears on the wire.
        field: &'static str,
    },

    /// A text field exceeds its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong {
        /// The field name as it appears on the wire.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// A date string is not a valid ISO 8601 calendar date.
    #[error("invalid date for {field}: \"{value}\" (expected YYYY-MM-DD)")]
    InvalidDate {
        /// The field name as it appears on the wire.
        field: &'static str,
        /// The string that failed to parse.
        value: String,
    },
}

impl ValidationError {
    /// The wire name of the field this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "email",
            Self::EmptyField { field } | Self::TooLong { field, .. } => field,
            Self::InvalidDate { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_email_display_carries_input() {
        let err = ValidationError::InvalidEmail("not-an-email".to_string());
        assert!(format!("{err}").contains("not-an-email"));
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn too_long_display_carries_limit() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("name"));
        assert!(msg.contains("100"));
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn invalid_date_reports_field() {
        let err = ValidationError::InvalidDate {
            field: "dateOfBirth",
            value: "31/12/1990".to_string(),
        };
        assert_eq!(err.field(), "dateOfBirth");
        assert!(format!("{err}").contains("YYYY-MM-DD"));
    }
}
