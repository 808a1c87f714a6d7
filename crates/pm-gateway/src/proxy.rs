//! # Upstream Forwarding
//!
//! | Gateway path            | Upstream                       | Filter |
//! |-------------------------|--------------------------------|--------|
//! | `POST /auth/login`      | `{auth}/login`                 | none   |
//! | `GET /auth/validate`    | `{auth}/validate`              | none   |
//! | `/api/patients`         | `{patients}/patients`          | bearer |
//! | `/api/patients/*path`   | `{patients}/patients/{path}`   | bearer |
//!
//! No other `/auth/...` path is routed: when both surfaces are served by one
//! upstream, a wildcard would reach `/patients` without the filter.
//!
//! Method, query string, body and end-to-end headers are copied. Hop-by-hop
//! headers, `Host` and `Content-Length` are dropped in both directions.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, HeaderName};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::{any, get, post};
use axum::Router;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::filter::{require_bearer, RemoteTokenValidator, SharedValidator};

/// Largest request body the gateway will forward.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Upstream targets and the client used to reach them.
#[derive(Debug, Clone)]
pub struct Upstreams {
    http: reqwest::Client,
    auth: Url,
    patients: Url,
    timeout: Duration,
}

impl Upstreams {
    pub fn new(auth: Url, patients: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            auth,
            patients,
            timeout,
        })
    }

    fn target(base: &Url, path: &str) -> Result<Url, GatewayError> {
        let raw = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| GatewayError::BadGateway(format!("bad upstream URL {raw}: {e}")))
    }

    /// Forward one request to `target` and relay the answer.
    async fn forward(&self, mut target: Url, request: Request) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| GatewayError::PayloadTooLarge(e.to_string()))?;
        target.set_query(parts.uri.query());

        let send = self
            .http
            .request(parts.method.clone(), target.clone())
            .headers(end_to_end(parts.headers))
            .body(body)
            .send();

        let upstream = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| GatewayError::GatewayTimeout(format!("{target} after {:?}", self.timeout)))?
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::GatewayTimeout(format!("{target}: {e}"))
                } else {
                    GatewayError::BadGateway(format!("{target}: {e}"))
                }
            })?;

        let status = upstream.status();
        let headers = end_to_end(upstream.headers().clone());
        let bytes: Bytes = upstream
            .bytes()
            .await
            .map_err(|e| GatewayError::BadGateway(format!("{target}: reading body: {e}")))?;

        tracing::debug!(method = %parts.method, target = %target, status = status.as_u16(), "forwarded");

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

fn end_to_end(mut headers: HeaderMap) -> HeaderMap {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::CONTENT_LENGTH);
    headers
}

/// Gateway handler state.
#[derive(Clone)]
pub struct GatewayState {
    pub upstreams: Upstreams,
    pub validator: SharedValidator,
}

impl GatewayState {
    /// Production wiring: remote verifier plus configured upstreams.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let validator = RemoteTokenValidator::new(&config.auth_url, config.verify_timeout())?;
        let upstreams = Upstreams::new(
            config.auth_url.clone(),
            config.patient_url.clone(),
            config.upstream_timeout(),
        )?;
        Ok(Self::new(upstreams, std::sync::Arc::new(validator)))
    }

    pub fn new(upstreams: Upstreams, validator: SharedValidator) -> Self {
        Self {
            upstreams,
            validator,
        }
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("upstreams", &self.upstreams)
            .finish_non_exhaustive()
    }
}

/// Build the forwarding router.
pub fn router(state: GatewayState) -> Router {
    let patients = Router::new()
        .route("/api/patients", any(forward_patients_root))
        .route("/api/patients/*path", any(forward_patients))
        .route_layer(from_fn_with_state(state.validator.clone(), require_bearer));

    Router::new()
        .route("/auth/login", post(forward_login))
        .route("/auth/validate", get(forward_validate))
        .merge(patients)
        .with_state(state)
}

async fn forward_login(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let target = Upstreams::target(&state.upstreams.auth, "login")?;
    state.upstreams.forward(target, request).await
}

async fn forward_validate(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let target = Upstreams::target(&state.upstreams.auth, "validate")?;
    state.upstreams.forward(target, request).await
}

async fn forward_patients_root(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let target = Upstreams::target(&state.upstreams.patients, "patients")?;
    state.upstreams.forward(target, request).await
}

async fn forward_patients(
    State(state): State<GatewayState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, GatewayError> {
    let target = Upstreams::target(
        &state.upstreams.patients,
        &format!("patients/{}", path.trim_start_matches('/')),
    )?;
    state.upstreams.forward(target, request).await
}
