//! Rotation Engine: the single choke point through which refresh tokens are
//! exchanged.
//!
//! Flow Overview: fetch the record, mint a new token pair, compare-and-swap the
//! stored refresh token against the value that was read (or presented), and
//! return the record carrying the new pair. The engine never retries; it
//! classifies failures and hands them back to the caller.

mod error;

pub use error::{ErrorClass, RotationError};

use crate::{
    directory::{DirectoryError, UserDirectory},
    identity::IdentityRecord,
    token::TokenMinter,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_DIRECTORY_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone)]
pub struct RotationEngine {
    directory: Arc<dyn UserDirectory>,
    minter: TokenMinter,
    directory_timeout: Duration,
}

impl std::fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationEngine")
            .field("minter", &self.minter)
            .field("directory_timeout", &self.directory_timeout)
            .finish_non_exhaustive()
    }
}

impl RotationEngine {
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, minter: TokenMinter) -> Self {
        Self {
            directory,
            minter,
            directory_timeout: Duration::from_secs(DEFAULT_DIRECTORY_TIMEOUT_SECONDS),
        }
    }

    /// Bound every directory call made by this engine.
    #[must_use]
    pub fn with_directory_timeout(mut self, directory_timeout: Duration) -> Self {
        self.directory_timeout = directory_timeout;
        self
    }

    #[must_use]
    pub fn directory_timeout(&self) -> Duration {
        self.directory_timeout
    }

    #[must_use]
    pub fn minter(&self) -> &TokenMinter {
        &self.minter
    }

    /// Check that the directory answers within the configured bound.
    ///
    /// # Errors
    /// Returns [`RotationError::DirectoryUnavailable`] if the ping fails or times out.
    pub async fn check_directory(&self) -> Result<(), RotationError> {
        self.bounded(self.directory.ping()).await
    }

    /// Rotate the tokens of the identity `id`.
    ///
    /// The compare value for the swap is the refresh token read during the lookup.
    ///
    /// # Errors
    /// - [`RotationError::NotFound`] if no identity has this id (a blank id never does)
    /// - [`RotationError::Mint`] if minting fails
    /// - [`RotationError::StaleRotation`] if another rotation consumed the token first
    /// - [`RotationError::DirectoryUnavailable`] on directory failure or timeout
    #[instrument(skip(self))]
    pub async fn rotate_by_id(&self, id: &str) -> Result<IdentityRecord, RotationError> {
        if id.trim().is_empty() {
            return Err(RotationError::NotFound);
        }

        let record = self
            .bounded(self.directory.find_by_id(id))
            .await?
            .ok_or(RotationError::NotFound)?;

        let expected = record.refresh_token.clone();
        self.rotate(record, &expected).await
    }

    /// Exchange a presented refresh token for a new token pair.
    ///
    /// The presented token itself is the compare value, so only one of several
    /// concurrent presentations of the same token can win.
    ///
    /// # Errors
    /// - [`RotationError::InvalidRequest`] for a blank token
    /// - [`RotationError::NotFound`] if no identity currently holds the token
    /// - [`RotationError::Mint`] if minting fails
    /// - [`RotationError::StaleRotation`] if a concurrent rotation won the swap
    /// - [`RotationError::DirectoryUnavailable`] on directory failure or timeout
    #[instrument(skip_all)]
    pub async fn rotate_by_refresh_token(
        &self,
        presented: &str,
    ) -> Result<IdentityRecord, RotationError> {
        if presented.trim().is_empty() {
            return Err(RotationError::InvalidRequest(
                "missing refresh token".to_string(),
            ));
        }

        let record = self
            .bounded(self.directory.find_by_refresh_token(presented))
            .await?
            .ok_or(RotationError::NotFound)?;

        self.rotate(record, presented).await
    }

    async fn rotate(
        &self,
        mut record: IdentityRecord,
        expected: &str,
    ) -> Result<IdentityRecord, RotationError> {
        let refresh_token = self.minter.mint_refresh_token().map_err(|err| {
            error!(identity = %record.id, "Failed to mint refresh token: {err}");
            RotationError::from(err)
        })?;
        let access_token = self.minter.mint_access_token(&record.id).map_err(|err| {
            error!(identity = %record.id, "Failed to mint access token: {err}");
            RotationError::from(err)
        })?;

        let swapped = self
            .bounded(self.directory.compare_and_swap_refresh_token(
                &record.id,
                expected,
                &refresh_token,
            ))
            .await?;

        if !swapped {
            warn!(identity = %record.id, "Refresh token already rotated by a concurrent request");
            return Err(RotationError::StaleRotation);
        }

        info!(identity = %record.id, "Rotated refresh token");

        record.refresh_token = refresh_token;
        record.access_token = access_token;
        Ok(record)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DirectoryError>>,
    ) -> Result<T, RotationError> {
        match timeout(self.directory_timeout, call).await {
            Ok(result) => result.map_err(|err| {
                error!("User directory call failed: {err}");
                RotationError::from(err)
            }),
            Err(_) => {
                error!(
                    "User directory call timed out after {:?}",
                    self.directory_timeout
                );
                Err(DirectoryError::Timeout(self.directory_timeout).into())
            }
        }
    }
}
