//! # Identity Newtypes
//!
//! [`PatientId`] is always valid by construction. [`Email`] validates its
//! format and normalizes to a trimmed, lower-cased form when it is built, so
//! two spellings of one mailbox compare equal everywhere the uniqueness rule
//! is enforced.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum accepted length of an email address (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// A unique identifier for a patient record.
///
/// Generated exactly once, when the record is first persisted, and never
/// reassigned afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(Uuid);

impl PatientId {
    /// Create a new random patient identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a patient identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PatientId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A validated, normalized email address.
///
/// # Validation
///
/// - Surrounding whitespace is trimmed, then the value is lower-cased
/// - Exactly one `@`, with a non-empty local part and domain
/// - The domain contains a dot that is neither its first nor last character
/// - No interior whitespace, at most 254 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create an email from a string value, validating and normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] if the format is invalid.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty()
            || normalized.len() > MAX_EMAIL_LEN
            || normalized.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidEmail(raw));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(ValidationError::InvalidEmail(raw));
        };
        if local.is_empty() || domain.contains('@') {
            return Err(ValidationError::InvalidEmail(raw));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(ValidationError::InvalidEmail(raw));
        }

        Ok(Self(normalized))
    }

    /// Access the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Email::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::new(s)
    }
}
