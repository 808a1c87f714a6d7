//! # Patient Surface
//!
//! CRUD over patient records plus the out-of-band provisioning retry.
//! Served behind the gateway, which has already admitted the caller.
//!
//! | Method | Path | Outcome |
//! |--------|------|---------|
//! | GET    | `/patients` | 200 list |
//! | POST   | `/patients` | 201 `{patient, provisioning}`, 409, 422 |
//! | GET    | `/patients/:id` | 200, 404 |
//! | PUT    | `/patients/:id` | 200, 404, 409, 422 |
//! | DELETE | `/patients/:id` | 204, 404 |
//! | POST   | `/patients/:id/billing-account` | 200 `{provisioning}`, 404 |

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use pm_core::{NewPatient, Patient, PatientChanges, PatientId, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::orchestrator::{
    CreationOutcome, DeletionOutcome, LookupOutcome, ProvisioningStatus, RetryOutcome,
    UpdateOutcome,
};
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

/// Request to register a patient.
///
/// Missing fields deserialize as empty and are reported by validation, so
/// the client sees every problem in one 422.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_of_birth: String,
    /// ISO date, `YYYY-MM-DD`. Required on creation.
    #[serde(default)]
    pub registered_date: Option<String>,
}

impl Validate for CreatePatientRequest {
    type Output = NewPatient;

    fn validate(&self) -> Result<NewPatient, Vec<ValidationError>> {
        NewPatient::parse(
            &self.name,
            &self.email,
            &self.address,
            &self.date_of_birth,
            self.registered_date.as_deref(),
        )
    }
}

/// Request to update a patient. The registration date cannot change.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_of_birth: String,
}

impl Validate for UpdatePatientRequest {
    type Output = PatientChanges;

    fn validate(&self) -> Result<PatientChanges, Vec<ValidationError>> {
        PatientChanges::parse(&self.name, &self.email, &self.address, &self.date_of_birth)
    }
}

// -- Response DTOs ------------------------------------------------------------

/// Patient as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub registered_date: NaiveDate,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        Self {
            id: *patient.id.as_uuid(),
            name: patient.name,
            email: patient.email.to_string(),
            address: patient.address,
            date_of_birth: patient.date_of_birth,
            registered_date: patient.registered_date,
        }
    }
}

/// Billing provisioning state.
///
/// `status` is `CONFIRMED` (with `accountId`) or `PENDING` (with `reason`:
/// `CONNECTION`, `REJECTED` or `TIMEOUT`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<ProvisioningStatus> for ProvisioningResponse {
    fn from(status: ProvisioningStatus) -> Self {
        match status {
            ProvisioningStatus::Confirmed { account_id } => Self {
                status: "CONFIRMED".into(),
                account_id: Some(account_id),
                reason: None,
            },
            ProvisioningStatus::Pending { reason } => Self {
                status: "PENDING".into(),
                account_id: None,
                reason: Some(reason.as_str().into()),
            },
        }
    }
}

/// A newly created patient with its provisioning state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientResponse {
    pub patient: PatientResponse,
    pub provisioning: ProvisioningResponse,
}

/// Result of a provisioning retry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryProvisioningResponse {
    pub provisioning: ProvisioningResponse,
}

// -- Router -------------------------------------------------------------------

/// Build the patients router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/billing-account", post(retry_provisioning))
}

fn patient_id(path: Result<Path<Uuid>, PathRejection>) -> Result<PatientId, AppError> {
    path.map(|Path(id)| PatientId::from_uuid(id))
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

// -- Handlers -----------------------------------------------------------------

/// GET /patients: List all patients.
#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients ordered by name", body = Vec<PatientResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientResponse>>, AppError> {
    let patients = state.orchestrator.list().await?;
    Ok(Json(patients.into_iter().map(PatientResponse::from).collect()))
}

/// POST /patients: Register a patient.
#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient created", body = CreatePatientResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePatientResponse>), AppError> {
    let new = extract_validated_json(body)?;

    match state.orchestrator.create(new).await? {
        CreationOutcome::Created {
            patient,
            provisioning,
        } => Ok((
            StatusCode::CREATED,
            Json(CreatePatientResponse {
                patient: patient.into(),
                provisioning: provisioning.into(),
            }),
        )),
        CreationOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// GET /patients/:id: Fetch one patient.
#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient found", body = PatientResponse),
        (status = 404, description = "Patient not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn get_patient(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PatientResponse>, AppError> {
    let id = patient_id(path)?;
    match state.orchestrator.get(id).await? {
        LookupOutcome::Found(patient) => Ok(Json(patient.into())),
        LookupOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// PUT /patients/:id: Update a patient.
#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = PatientResponse),
        (status = 404, description = "Patient not found", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn update_patient(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdatePatientRequest>, JsonRejection>,
) -> Result<Json<PatientResponse>, AppError> {
    let id = patient_id(path)?;
    let changes = extract_validated_json(body)?;

    match state.orchestrator.update(id, changes).await? {
        UpdateOutcome::Updated(patient) => Ok(Json(patient.into())),
        UpdateOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// DELETE /patients/:id: Remove a patient.
#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Patient not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn delete_patient(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = patient_id(path)?;
    match state.orchestrator.delete(id).await? {
        DeletionOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeletionOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// POST /patients/:id/billing-account: Retry billing provisioning.
#[utoipa::path(
    post,
    path = "/patients/{id}/billing-account",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Provisioning attempted", body = RetryProvisioningResponse),
        (status = 404, description = "Patient not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "patients"
)]
async fn retry_provisioning(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RetryProvisioningResponse>, AppError> {
    let id = patient_id(path)?;
    match state.orchestrator.retry_provisioning(id).await? {
        RetryOutcome::Provisioned(status) => Ok(Json(RetryProvisioningResponse {
            provisioning: status.into(),
        })),
        RetryOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}
