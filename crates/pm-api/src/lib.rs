//! # pm-api: Patient Management API Service
//!
//! Serves the credential surface and the patient registry, and runs the
//! patient creation workflow through the [`orchestrator`].
//!
//! ## API Surface
//!
//! | Prefix        | Module                  | Domain                 |
//! |---------------|-------------------------|------------------------|
//! | `/login`      | [`routes::auth`]        | Credential issue       |
//! | `/validate`   | [`routes::auth`]        | Credential check       |
//! | `/patients/*` | [`routes::patients`]    | Patient registry       |
//! | `/openapi.json` | [`openapi`]           | API document           |
//! | `/health/*`   | this module             | Probes                 |
//!
//! The patient surface trusts its caller: it is deployed behind the gateway,
//! which admits a request only after `/validate` accepted its credential.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod orchestrator;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::patients::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
