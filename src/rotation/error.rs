use crate::{directory::DirectoryError, token::MintError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("identity not found")]
    NotFound,
    #[error("refresh token was already rotated")]
    StaleRotation,
    #[error("failed to mint tokens: {0}")]
    Mint(#[from] MintError),
    #[error("user directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl From<DirectoryError> for RotationError {
    fn from(err: DirectoryError) -> Self {
        Self::DirectoryUnavailable(err.to_string())
    }
}

/// How the boundary layer should treat a [`RotationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input, the caller's fault.
    InvalidRequest,
    /// Unknown identity, unknown or replayed token, or a lost race.
    Unauthorized,
    /// Not the caller's fault.
    Internal,
}

impl RotationError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidRequest(_) => ErrorClass::InvalidRequest,
            Self::NotFound | Self::StaleRotation => ErrorClass::Unauthorized,
            Self::Mint(_) | Self::DirectoryUnavailable(_) => ErrorClass::Internal,
        }
    }

    /// Whether a caller may reasonably try again (after backoff, or after
    /// restarting the flow that produced the stale context).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StaleRotation | Self::Mint(_) | Self::DirectoryUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classes() {
        assert_eq!(
            RotationError::InvalidRequest("x".to_string()).class(),
            ErrorClass::InvalidRequest
        );
        assert_eq!(RotationError::NotFound.class(), ErrorClass::Unauthorized);
        assert_eq!(
            RotationError::StaleRotation.class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(
            RotationError::Mint(MintError::SecretUnavailable).class(),
            ErrorClass::Internal
        );
        assert_eq!(
            RotationError::DirectoryUnavailable("down".to_string()).class(),
            ErrorClass::Internal
        );
    }

    #[test]
    fn retryable() {
        assert!(RotationError::StaleRotation.is_retryable());
        assert!(RotationError::DirectoryUnavailable("down".to_string()).is_retryable());
        assert!(!RotationError::NotFound.is_retryable());
        assert!(!RotationError::InvalidRequest("x".to_string()).is_retryable());
    }

    #[test]
    fn directory_timeout_is_unavailable() {
        let err = RotationError::from(DirectoryError::Timeout(Duration::from_secs(3)));
        assert!(matches!(err, RotationError::DirectoryUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
