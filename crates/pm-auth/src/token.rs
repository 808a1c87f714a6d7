//! # Bearer Credentials
//!
//! Credentials are compact HS256 JWTs. The claim set is fixed:
//!
//! | claim | meaning                              |
//! |-------|--------------------------------------|
//! | `sub` | authenticated identity (email)       |
//! | `role`| role of the identity                 |
//! | `iat` | issued-at, seconds since the epoch   |
//! | `exp` | expiry, seconds since the epoch      |
//!
//! Verification applies no clock leeway: a credential is rejected from the
//! first second past `exp`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::secret::SigningSecret;

/// Default credential lifetime: ten hours.
pub const DEFAULT_TOKEN_VALIDITY_SECS: i64 = 10 * 60 * 60;

/// The claim set carried by every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated identity.
    pub sub: String,
    /// Role granted to the identity.
    pub role: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// A freshly minted credential: the encoded token plus the claims inside it.
#[derive(Clone)]
pub struct Credential {
    token: String,
    claims: Claims,
}

impl Credential {
    /// The encoded token, as sent in `Authorization: Bearer <token>`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The claims the token carries.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Consume the credential, keeping only the encoded token.
    pub fn into_token(self) -> String {
        self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not a well-formed token for this issuer.
    Malformed,
    /// Signed with a different key, or altered after signing.
    SignatureMismatch,
    /// Past its expiry.
    Expired,
}

impl InvalidReason {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::SignatureMismatch => "signature_mismatch",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Signature and expiry check out.
    Valid(Claims),
    /// Rejected for the given reason.
    Invalid(InvalidReason),
}

impl Verification {
    /// Whether the credential was accepted.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Mints signed credentials.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<SigningSecret>,
    validity: Duration,
}

impl TokenIssuer {
    /// Build an issuer with the given credential lifetime in seconds.
    pub fn new(secret: Arc<SigningSecret>, validity_secs: i64) -> Self {
        Self {
            secret,
            validity: Duration::seconds(validity_secs),
        }
    }

    /// Configured credential lifetime.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Mint a credential issued now.
    pub fn issue(&self, subject: &str, role: &str) -> Result<Credential, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Mint a credential with an explicit issue time.
    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::EmptyClaim("subject"));
        }
        if role.is_empty() {
            return Err(AuthError::EmptyClaim("role"));
        }

        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(Credential { token, claims })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("validity_secs", &self.validity.num_seconds())
            .finish_non_exhaustive()
    }
}

/// Checks credentials minted by a [`TokenIssuer`] sharing the same secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Arc<SigningSecret>,
}

impl TokenVerifier {
    /// Build a verifier over the shared secret.
    pub fn new(secret: Arc<SigningSecret>) -> Self {
        Self { secret }
    }

    /// Verify a raw token (without the `Bearer ` prefix).
    pub fn verify(&self, token: &str) -> Verification {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Verification::Valid(data.claims),
            Err(err) => Verification::Invalid(match err.kind() {
                ErrorKind::ExpiredSignature => InvalidReason::Expired,
                ErrorKind::InvalidSignature => InvalidReason::SignatureMismatch,
                _ => InvalidReason::Malformed,
            }),
        }
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secret(byte: u8) -> Arc<SigningSecret> {
        Arc::new(SigningSecret::from_bytes(vec![byte; 32]).unwrap())
    }

    fn pair() -> (TokenIssuer, TokenVerifier) {
        let secret = secret(0x42);
        (
            TokenIssuer::new(secret.clone(), DEFAULT_TOKEN_VALIDITY_SECS),
            TokenVerifier::new(secret),
        )
    }

    #[test]
    fn issued_credential_verifies_with_its_claims() {
        let (issuer, verifier) = pair();
        let credential = issuer.issue("jane@example.com", "ADMIN").unwrap();

        match verifier.verify(credential.token()) {
            Verification::Valid(claims) => {
                assert_eq!(claims.sub, "jane@example.com");
                assert_eq!(claims.role, "ADMIN");
                assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_VALIDITY_SECS);
                assert_eq!(&claims, credential.claims());
            }
            other => panic!("expected valid, got {other:?}"),
        }
    }

    #[test]
    fn credential_from_other_secret_is_a_signature_mismatch() {
        let foreign = TokenIssuer::new(secret(0x01), DEFAULT_TOKEN_VALIDITY_SECS);
        let (_, verifier) = pair();
        let credential = foreign.issue("jane@example.com", "ADMIN").unwrap();
        assert_eq!(
            verifier.verify(credential.token()),
            Verification::Invalid(InvalidReason::SignatureMismatch)
        );
    }

    #[test]
    fn expired_credential_is_rejected() {
        let (issuer, verifier) = pair();
        let issued_at = Utc::now() - Duration::seconds(DEFAULT_TOKEN_VALIDITY_SECS + 5);
        let credential = issuer.issue_at("jane@example.com", "ADMIN", issued_at).unwrap();
        assert_eq!(
            verifier.verify(credential.token()),
            Verification::Invalid(InvalidReason::Expired)
        );
    }

    #[test]
    fn credential_just_inside_validity_is_accepted() {
        let (issuer, verifier) = pair();
        let issued_at = Utc::now() - Duration::seconds(DEFAULT_TOKEN_VALIDITY_SECS - 60);
        let credential = issuer.issue_at("jane@example.com", "ADMIN", issued_at).unwrap();
        assert!(verifier.verify(credential.token()).is_valid());
    }

    #[test]
    fn garbage_is_malformed() {
        let (_, verifier) = pair();
        for raw in ["", "abc", "a.b.c", "not a token at all"] {
            assert_eq!(
                verifier.verify(raw),
                Verification::Invalid(InvalidReason::Malformed),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn empty_subject_or_role_cannot_be_issued() {
        let (issuer, _) = pair();
        assert!(matches!(
            issuer.issue("", "ADMIN"),
            Err(AuthError::EmptyClaim("subject"))
        ));
        assert!(matches!(
            issuer.issue("jane@example.com", ""),
            Err(AuthError::EmptyClaim("role"))
        ));
    }

    #[test]
    fn debug_output_hides_token() {
        let (issuer, _) = pair();
        let credential = issuer.issue("jane@example.com", "ADMIN").unwrap();
        assert!(!format!("{credential:?}").contains(credential.token()));
    }

    proptest! {
        #[test]
        fn round_trip_preserves_subject_and_role(
            subject in "[a-z0-9]{1,12}@[a-z]{1,8}\\.[a-z]{2,4}",
            role in "[A-Z_]{1,10}",
        ) {
            let (issuer, verifier) = pair();
            let credential = issuer.issue(&subject, &role).unwrap();
            match verifier.verify(credential.token()) {
                Verification::Valid(claims) => {
                    prop_assert_eq!(claims.sub, subject);
                    prop_assert_eq!(claims.role, role);
                }
                other => prop_assert!(false, "expected valid, got {:?}", other),
            }
        }

        #[test]
        fn altered_signature_is_never_accepted(index in 0usize..43, replacement in "[A-Za-z0-9_-]") {
            let (issuer, verifier) = pair();
            let token = issuer.issue("jane@example.com", "ADMIN").unwrap().into_token();
            let dot = token.rfind('.').unwrap();
            let mut signature: Vec<char> = token[dot + 1..].chars().collect();
            let index = index % signature.len();
            let replacement = replacement.chars().next().unwrap();
            prop_assume!(signature[index] != replacement);
            signature[index] = replacement;
            let tampered = format!("{}.{}", &token[..dot], signature.into_iter().collect::<String>());

            prop_assert!(!verifier.verify(&tampered).is_valid());
        }

        #[test]
        fn altered_payload_is_never_accepted(role in "[A-Z]{3,8}") {
            let (issuer, verifier) = pair();
            let original = issuer.issue("jane@example.com", "USER").unwrap().into_token();
            let forged_source = issuer.issue("jane@example.com", &role).unwrap().into_token();
            prop_assume!(role != "USER");

            // Splice the payload of one credential onto the signature of another.
            let mut parts: Vec<&str> = original.split('.').collect();
            let forged_payload = forged_source.split('.').nth(1).unwrap();
            parts[1] = forged_payload;
            let spliced = parts.join(".");

            prop_assert_eq!(
                verifier.verify(&spliced),
                Verification::Invalid(InvalidReason::SignatureMismatch)
            );
        }
    }
}
