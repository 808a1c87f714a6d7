//! # pm-gateway: Edge Gateway
//!
//! Single entry point for clients. Credential traffic passes straight
//! through to the auth surface; patient traffic is admitted only after the
//! [`filter`] has had the bearer credential accepted by the auth service.
//!
//! | Path                  | Module       | Filter |
//! |-----------------------|--------------|--------|
//! | `POST /auth/login`    | [`proxy`]    | none   |
//! | `GET /auth/validate`  | [`proxy`]    | none   |
//! | `/api/patients*`      | [`proxy`]    | bearer |
//! | `/health/*`           | this module  | none   |
//!
//! Anything else, including other `/auth/...` paths, is 404.

pub mod config;
pub mod error;
pub mod filter;
pub mod proxy;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use filter::{extract_bearer, RemoteTokenValidator, TokenValidator, VerifierAnswer};
pub use proxy::{GatewayState, Upstreams};

/// Assemble the gateway router.
pub fn app(state: GatewayState) -> Router {
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(proxy::router(state))
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
