//! Authentication error types.
//!
//! These are operator-facing. Client-facing rejections are expressed as
//! [`crate::Verification::Invalid`] or an empty login result instead.

use thiserror::Error;

/// Errors from credential and secret handling.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The configured signing secret is not valid base64.
    #[error("signing secret is not valid base64: {0}")]
    InvalidSecret(String),

    /// The decoded signing secret is shorter than HS256 requires.
    #[error("signing secret must be at least {min} bytes, got {len}")]
    SecretTooShort {
        /// Decoded secret length in bytes.
        len: usize,
        /// Minimum accepted length in bytes.
        min: usize,
    },

    /// A claim required to mint a credential is empty.
    #[error("cannot issue a credential with an empty {0}")]
    EmptyClaim(&'static str),

    /// Token encoding failed.
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// The user store could not be queried.
    #[error("user store error: {0}")]
    UserStore(String),
}
