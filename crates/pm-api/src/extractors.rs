//! # Custom Extractors & Validation
//!
//! Request DTOs arrive as loose JSON and are turned into validated domain
//! inputs through the [`Validate`] trait. Malformed JSON is a 400; a body
//! that parses but fails field rules is a 422 listing every bad field.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use pm_core::ValidationError;

use crate::error::AppError;

/// Request types that validate into a domain input.
pub trait Validate {
    /// The validated form.
    type Output;

    /// Check every field, reporting all failures at once.
    fn validate(&self) -> Result<Self::Output, Vec<ValidationError>>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it into its domain form.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Output, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::from)
}
