//! # pm-auth: Credential Issuer, Verifier and Authenticator
//!
//! Mints and checks the signed bearer credentials that every request to the
//! patient surface must carry.
//!
//! - [`TokenIssuer`] signs a compact HS256 JWT carrying subject, role,
//!   issued-at and expiry.
//! - [`TokenVerifier`] checks signature and expiry and answers with a
//!   [`Verification`]; it never errors past its boundary.
//! - [`Authenticator`] exchanges an email/password pair for a credential and
//!   fails closed without saying which part of the check failed.
//!
//! Both the issuer and the verifier are built from one shared
//! [`SigningSecret`], loaded once at startup and passed in explicitly.

pub mod authenticator;
pub mod error;
pub mod secret;
pub mod token;

pub use authenticator::{
    hash_password, Authenticator, InMemoryUserStore, LoginRequest, UserRecord, UserStore,
};
pub use error::AuthError;
pub use secret::SigningSecret;
pub use token::{
    Claims, Credential, InvalidReason, TokenIssuer, TokenVerifier, Verification,
    DEFAULT_TOKEN_VALIDITY_SECS,
};
