//! User Directory: the persistence boundary of the rotation protocol.
//!
//! Implementations must make [`UserDirectory::compare_and_swap_refresh_token`]
//! atomic with respect to concurrent callers on the same record. Nothing else in
//! the crate serializes rotations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PostgresDirectory;

use crate::identity::IdentityRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory call timed out after {0:?}")]
    Timeout(Duration),
    #[error("directory backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up an identity by its opaque identifier.
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>, DirectoryError>;

    /// Look up the identity whose current refresh token equals `token`.
    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<IdentityRecord>, DirectoryError>;

    /// Replace the refresh token of identity `id` with `new` only if it still
    /// equals `expected`. Returns `false` when the comparison fails.
    async fn compare_and_swap_refresh_token(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, DirectoryError>;

    /// Cheap liveness check used by `/health`.
    async fn ping(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}
