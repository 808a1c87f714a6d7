//! # Auth Surface
//!
//! `POST /login` exchanges an email/password pair for a bearer credential.
//! `GET /validate` checks the bearer credential on the request; the gateway
//! calls it once per filtered request and only looks at the status code.
//!
//! Both endpoints answer 401 with the same generic body for every failure
//! cause. The precise reason is logged at `warn`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use pm_auth::{LoginRequest, Verification};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize, ToSchema)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginBody")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Issued credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Claims of a credential that passed validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub subject: String,
    pub role: String,
    /// Expiry, seconds since the Unix epoch.
    pub expires_at: i64,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/validate", get(validate))
}

/// POST /login: Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Credential issued", body = LoginResponse),
        (status = 401, description = "Login rejected", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let body = extract_json(body)?;
    let request = LoginRequest {
        email: body.email,
        password: body.password,
    };

    state
        .authenticator
        .authenticate(&request)
        .await
        .map(|credential| {
            Json(LoginResponse {
                token: credential.into_token(),
            })
        })
        .ok_or_else(|| AppError::Unauthorized("login rejected".into()))
}

/// GET /validate: Check the request's bearer credential.
#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Credential valid", body = ValidateResponse),
        (status = 401, description = "Credential missing or invalid", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".into()))?;

    match state.verifier.verify(token) {
        Verification::Valid(claims) => Ok(Json(ValidateResponse {
            subject: claims.sub,
            role: claims.role,
            expires_at: claims.exp,
        })),
        Verification::Invalid(reason) => {
            Err(AppError::Unauthorized(format!("credential rejected: {reason}")))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_prefix_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn login_body_debug_hides_password() {
        let body = LoginBody {
            email: "a@b.co".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{body:?}").contains("hunter2"));
    }
}
