//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer credential security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Credential obtained from POST /login."))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document for the auth and patient surfaces.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Patient Management API",
        description = "Credential login and validation, and the patient registry.\n\nPatient endpoints are reached through the gateway under `/api/patients` and require `Authorization: Bearer <token>`. Health probes (`/health/*`) are unauthenticated."
    ),
    paths(
        crate::routes::auth::login,
        crate::routes::auth::validate,
        crate::routes::patients::list_patients,
        crate::routes::patients::create_patient,
        crate::routes::patients::get_patient,
        crate::routes::patients::update_patient,
        crate::routes::patients::delete_patient,
        crate::routes::patients::retry_provisioning,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::auth::LoginBody,
            crate::routes::auth::LoginResponse,
            crate::routes::auth::ValidateResponse,
            crate::routes::patients::CreatePatientRequest,
            crate::routes::patients::UpdatePatientRequest,
            crate::routes::patients::PatientResponse,
            crate::routes::patients::ProvisioningResponse,
            crate::routes::patients::CreatePatientResponse,
            crate::routes::patients::RetryProvisioningResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Credential issue and validation"),
        (name = "patients", description = "Patient registry"),
    )
)]
pub struct ApiDoc;

/// Build the router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/login",
            "/validate",
            "/patients",
            "/patients/{id}",
            "/patients/{id}/billing-account",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn document_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
