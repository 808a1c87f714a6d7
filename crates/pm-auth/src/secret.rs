//! The process-wide HMAC signing secret.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::AuthError;

/// Shared HMAC key for issuing and verifying credentials.
///
/// Loaded once at startup and handed to both [`crate::TokenIssuer`] and
/// [`crate::TokenVerifier`] behind an `Arc`. The bytes are zeroized on drop
/// and never appear in `Debug` output.
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Minimum key length in bytes (256 bits, the HS256 block requirement).
    pub const MIN_LEN: usize = 32;

    /// Decode a standard-alphabet base64 secret, as stored in configuration.
    pub fn from_base64(encoded: &str) -> Result<Self, AuthError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AuthError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() < Self::MIN_LEN {
            return Err(AuthError::SecretTooShort {
                len: bytes.len(),
                min: Self::MIN_LEN,
            });
        }
        Ok(Self(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningSecret").field(&"[REDACTED]").finish()
    }
}
