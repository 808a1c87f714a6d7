//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Everything here is either immutable or internally
//! synchronized, so cloning the state per request is cheap and safe.

use std::sync::Arc;

use pm_auth::{Authenticator, TokenVerifier};

use crate::orchestrator::Orchestrator;

/// Handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Patient workflows.
    pub orchestrator: Arc<Orchestrator>,
    /// Password login.
    pub authenticator: Arc<Authenticator>,
    /// Credential verification for `/validate`.
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Assemble state from its parts.
    pub fn new(
        orchestrator: Orchestrator,
        authenticator: Authenticator,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            authenticator: Arc::new(authenticator),
            verifier,
        }
    }
}
