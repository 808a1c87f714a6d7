//! # Service Bootstrap
//!
//! Wires configuration into a ready [`AppState`]:
//!
//! 1. **Stores**: Postgres when a pool is available, in-memory otherwise.
//! 2. **Seed user**: optional development login, hashed with Argon2id.
//! 3. **Credentials**: issuer and verifier over the shared signing secret.
//! 4. **Provisioner**: billing client, or a stand-in that leaves every
//!    patient pending when no billing service is configured.
//! 5. **Publisher**: broker REST ingress, or log-only when no broker is
//!    configured.

use std::sync::Arc;
use std::time::Duration;

use pm_auth::{
    hash_password, AuthError, Authenticator, InMemoryUserStore, TokenIssuer, TokenVerifier,
    UserRecord, UserStore,
};
use pm_billing_client::{AccountProvisioner, BillingClient, BillingError, NotConfigured};
use pm_core::{Email, ValidationError};
use pm_events::{EventPublisher, HttpBrokerPublisher, LoggingPublisher, PublishError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::{AppConfig, SeedUser};
use crate::db::patients::PgPatientStore;
use crate::db::users::PgUserStore;
use crate::orchestrator::Orchestrator;
use crate::state::AppState;
use crate::store::{InMemoryPatientStore, PatientStore};

/// Errors during service bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Credential setup or seed hashing failed.
    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),

    /// Seed user email is malformed.
    #[error("invalid SEED_USER_EMAIL: {0}")]
    SeedEmail(#[from] ValidationError),

    /// Billing client could not be built.
    #[error("billing client setup failed: {0}")]
    Billing(#[from] BillingError),

    /// Broker publisher could not be built.
    #[error("broker publisher setup failed: {0}")]
    Broker(#[from] PublishError),

    /// Seeding the database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Build application state from configuration and an optional database pool.
pub async fn bootstrap(
    config: &AppConfig,
    pool: Option<PgPool>,
) -> Result<AppState, BootstrapError> {
    let seed = config.seed_user.as_ref().map(seed_record).transpose()?;

    let (patients, users): (Arc<dyn PatientStore>, Arc<dyn UserStore>) = match pool {
        Some(pool) => {
            let users = PgUserStore::new(pool.clone());
            if let Some(record) = &seed {
                users.upsert(record).await?;
            }
            (Arc::new(PgPatientStore::new(pool)), Arc::new(users))
        }
        None => {
            let users = InMemoryUserStore::new();
            if let Some(record) = seed.clone() {
                users.insert(record);
            }
            (Arc::new(InMemoryPatientStore::new()), Arc::new(users))
        }
    };
    if let Some(record) = &seed {
        tracing::info!(email = %record.email, role = %record.role, "seed user registered");
    }

    let issuer = TokenIssuer::new(config.signing_secret.clone(), config.token_validity_secs);
    let verifier = TokenVerifier::new(config.signing_secret.clone());
    let authenticator = Authenticator::new(users, issuer)?;

    let provisioner: Arc<dyn AccountProvisioner> = match &config.billing.base_url {
        Some(url) => {
            tracing::info!(billing_url = %url, "billing client configured");
            Arc::new(BillingClient::new(config.billing.clone())?)
        }
        None => {
            tracing::warn!("BILLING_SERVICE_URL not set, new patients stay pending provisioning");
            Arc::new(NotConfigured)
        }
    };

    let publisher: Arc<dyn EventPublisher> = match &config.broker.url {
        Some(_) => {
            let publisher = HttpBrokerPublisher::new(&config.broker)?;
            tracing::info!(endpoint = %publisher.endpoint(), "broker publisher configured");
            Arc::new(publisher)
        }
        None => {
            tracing::warn!("BROKER_URL not set, patient events are logged only");
            Arc::new(LoggingPublisher)
        }
    };

    let orchestrator = Orchestrator::new(
        patients,
        provisioner,
        publisher,
        Duration::from_secs(config.store_timeout_secs),
        Duration::from_secs(config.provisioning_timeout_secs),
    );

    Ok(AppState::new(orchestrator, authenticator, verifier))
}

fn seed_record(seed: &SeedUser) -> Result<UserRecord, BootstrapError> {
    Ok(UserRecord {
        id: Uuid::new_v4(),
        email: Email::new(seed.email.as_str())?,
        password_hash: hash_password(&seed.password)?,
        role: seed.role.clone(),
    })
}
