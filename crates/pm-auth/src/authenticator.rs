//! # Password Login
//!
//! [`Authenticator::authenticate`] exchanges an email/password pair for a
//! signed credential. It fails closed: an unknown user, a wrong password, a
//! malformed email and a store fault all produce the same `None`, and an
//! unknown user still pays for a full password verification against a fixed
//! dummy hash so response timing does not reveal which accounts exist.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use parking_lot::RwLock;
use pm_core::Email;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::{Credential, TokenIssuer};

/// A stored login identity.
#[derive(Clone)]
pub struct UserRecord {
    /// Row identity.
    pub id: Uuid,
    /// Login email (normalized).
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Role claimed in issued credentials.
    pub role: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Lookup seam for login identities.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user registered under `email`, if any.
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, AuthError>;
}

/// Process-local user store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Email, UserRecord>>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.email.clone(), record);
    }

    /// Hash `password` and register a user under `email` with `role`.
    pub fn add_user(&self, email: Email, password: &str, role: &str) -> Result<(), AuthError> {
        let password_hash = hash_password(password)?;
        self.insert(UserRecord {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role: role.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.read().get(email).cloned())
    }
}

/// Login request body.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Exchanges login credentials for a signed bearer credential.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    dummy_hash: Arc<str>,
}

impl Authenticator {
    /// Build an authenticator over a user store and an issuer.
    ///
    /// Computes the dummy hash used to equalize timing for unknown users.
    pub fn new(users: Arc<dyn UserStore>, issuer: TokenIssuer) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("pm-auth-timing-guard")?;
        Ok(Self {
            users,
            issuer,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Authenticate a login request.
    ///
    /// Returns `None` for any failure. The reason is logged at debug level
    /// and never returned to the caller.
    pub async fn authenticate(&self, request: &LoginRequest) -> Option<Credential> {
        let user = match Email::new(request.email.as_str()) {
            Ok(email) => match self.users.find_by_email(&email).await {
                Ok(user) => user,
                Err(e) => {
                    tracing::error!(error = %e, "user lookup failed during login");
                    None
                }
            },
            Err(_) => None,
        };

        let (phc, role, subject) = match &user {
            Some(user) => (
                user.password_hash.clone(),
                Some(user.role.clone()),
                Some(user.email.to_string()),
            ),
            None => (self.dummy_hash.to_string(), None, None),
        };

        let password = request.password.clone();
        let matched = match tokio::task::spawn_blocking(move || verify_password(&password, &phc))
            .await
        {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        };

        let (Some(subject), Some(role), true) = (subject, role, matched) else {
            tracing::debug!("login rejected");
            return None;
        };

        match self.issuer.issue(&subject, &role) {
            Ok(credential) => {
                tracing::info!(subject = %subject, "credential issued");
                Some(credential)
            }
            Err(e) => {
                tracing::error!(error = %e, "credential signing failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SigningSecret;
    use crate::token::{TokenVerifier, Verification, DEFAULT_TOKEN_VALIDITY_SECS};

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn find_by_email(&self, _email: &Email) -> Result<Option<UserRecord>, AuthError> {
            Err(AuthError::UserStore("connection refused".into()))
        }
    }

    fn secret() -> Arc<SigningSecret> {
        Arc::new(SigningSecret::from_bytes(vec![9u8; 32]).unwrap())
    }

    fn authenticator(users: Arc<dyn UserStore>) -> Authenticator {
        Authenticator::new(users, TokenIssuer::new(secret(), DEFAULT_TOKEN_VALIDITY_SECS)).unwrap()
    }

    fn seeded() -> Authenticator {
        let users = InMemoryUserStore::new();
        users
            .add_user(Email::new("admin@clinic.org").unwrap(), "s3cret-pass", "ADMIN")
            .unwrap();
        authenticator(Arc::new(users))
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn correct_password_yields_verifiable_credential() {
        let auth = seeded();
        let credential = auth
            .authenticate(&login("admin@clinic.org", "s3cret-pass"))
            .await
            .expect("login should succeed");

        match TokenVerifier::new(secret()).verify(credential.token()) {
            Verification::Valid(claims) => {
                assert_eq!(claims.sub, "admin@clinic.org");
                assert_eq!(claims.role, "ADMIN");
            }
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_email_is_case_insensitive() {
        let auth = seeded();
        assert!(auth
            .authenticate(&login("Admin@Clinic.ORG", "s3cret-pass"))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let auth = seeded();
        assert!(auth
            .authenticate(&login("admin@clinic.org", "wrong"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let auth = seeded();
        assert!(auth
            .authenticate(&login("nobody@clinic.org", "s3cret-pass"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let auth = seeded();
        assert!(auth.authenticate(&login("admin", "s3cret-pass")).await.is_none());
    }

    #[tokio::test]
    async fn store_fault_fails_closed() {
        let auth = authenticator(Arc::new(FailingStore));
        assert!(auth
            .authenticate(&login("admin@clinic.org", "s3cret-pass"))
            .await
            .is_none());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
        assert!(!verify_password("other", &a));
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let request = login("a@b.co", "hunter2");
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
