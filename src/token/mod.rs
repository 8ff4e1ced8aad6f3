//! Token minting: signed access tokens and opaque refresh tokens.
//!
//! The two token kinds are produced by unrelated mechanisms. Access tokens are
//! HS256 JWTs signed with the configured secret; refresh tokens come straight
//! from the OS CSPRNG and never touch that secret.

pub mod access;
pub mod refresh;

pub use access::AccessClaims;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: u64 = 600;

#[derive(Debug, Error)]
pub enum MintError {
    #[error("signing secret is unavailable")]
    SecretUnavailable,
    #[error("failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("failed to gather entropy for refresh token: {0}")]
    Entropy(#[from] rand::Error),
}

/// Mints access and refresh tokens.
///
/// The signing secret is injected once at startup and never changes afterwards.
#[derive(Clone, Debug)]
pub struct TokenMinter {
    signing_secret: SecretString,
    access_token_ttl_seconds: i64,
}

impl TokenMinter {
    /// `access_token_ttl` is clamped to at least one second so `exp` is always
    /// strictly later than `iat`.
    #[must_use]
    pub fn new(signing_secret: SecretString, access_token_ttl: Duration) -> Self {
        let ttl_seconds = i64::try_from(access_token_ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            signing_secret,
            access_token_ttl_seconds: ttl_seconds.max(1),
        }
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    /// Mint a signed access token for `subject`, valid from now for the
    /// configured window.
    ///
    /// # Errors
    /// Returns [`MintError::SecretUnavailable`] if the secret is empty, or
    /// [`MintError::Signing`] if encoding fails.
    pub fn mint_access_token(&self, subject: &str) -> Result<String, MintError> {
        let claims = AccessClaims::new(
            subject,
            Utc::now().timestamp(),
            self.access_token_ttl_seconds,
        );
        Ok(access::sign(&claims, self.secret()?)?)
    }

    /// Mint a fresh opaque refresh token.
    ///
    /// # Errors
    /// Returns [`MintError::Entropy`] if the OS random source fails.
    pub fn mint_refresh_token(&self) -> Result<String, MintError> {
        Ok(refresh::generate()?)
    }

    /// Check signature and expiry of an access token minted with this secret.
    ///
    /// # Errors
    /// Returns [`MintError::SecretUnavailable`] if the secret is empty, or
    /// [`MintError::Signing`] if the token is invalid or expired.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, MintError> {
        Ok(access::verify(token, self.secret()?)?)
    }

    fn secret(&self) -> Result<&[u8], MintError> {
        let secret = self.signing_secret.expose_secret();
        if secret.is_empty() {
            return Err(MintError::SecretUnavailable);
        }
        Ok(secret.as_bytes())
    }
}
