//! `PostgreSQL` directory backed by the `users` table (see `sql/schema.sql`).
//!
//! Identifiers are UUIDs in storage and opaque strings everywhere else; an
//! identifier that does not parse as a UUID simply does not exist.

use super::{DirectoryError, UserDirectory};
use crate::identity::IdentityRecord;
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, debug, info_span, instrument};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn record_from_row(row: &PgRow) -> Result<IdentityRecord, DirectoryError> {
    let id: Uuid = row.try_get("id")?;
    Ok(IdentityRecord {
        id: id.to_string(),
        display_name: row.try_get("display_name")?,
        refresh_token: row.try_get("refresh_token")?,
        access_token: String::new(),
    })
}

#[async_trait]
impl UserDirectory for PostgresDirectory {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>, DirectoryError> {
        let Ok(id) = Uuid::parse_str(id) else {
            debug!("identifier is not a UUID, treating as unknown");
            return Ok(None);
        };

        let query = "SELECT id, display_name, refresh_token FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip_all)]
    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<IdentityRecord>, DirectoryError> {
        // Empty means "no token provisioned", never a match.
        if token.is_empty() {
            return Ok(None);
        }

        let query = "SELECT id, display_name, refresh_token FROM users WHERE refresh_token = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, expected, new))]
    async fn compare_and_swap_refresh_token(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, DirectoryError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(false);
        };

        // A single conditional UPDATE: row locking makes concurrent swaps on the
        // same id re-check the WHERE clause after the winner commits.
        let query = r"
            UPDATE users
            SET refresh_token = $3, rotated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(expected)
            .bind(new)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
    use std::time::Duration;

    fn unreachable_pool() -> PgPool {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("invalid")
            .database("invalid")
            .ssl_mode(PgSslMode::Disable);
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(options)
    }

    #[tokio::test]
    async fn non_uuid_id_is_unknown_without_touching_db() -> Result<(), DirectoryError> {
        let directory = PostgresDirectory::new(unreachable_pool());
        assert!(directory.find_by_id("does-not-exist").await?.is_none());
        assert!(
            !directory
                .compare_and_swap_refresh_token("does-not-exist", "r0", "r1")
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_token_is_unknown_without_touching_db() -> Result<(), DirectoryError> {
        let directory = PostgresDirectory::new(unreachable_pool());
        assert!(directory.find_by_refresh_token("").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_database_is_a_backend_error() {
        let directory = PostgresDirectory::new(unreachable_pool());
        let result = directory.find_by_id(&Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(DirectoryError::Backend(_))));

        let result = directory.find_by_refresh_token("r0").await;
        assert!(matches!(result, Err(DirectoryError::Backend(_))));

        assert!(matches!(
            directory.ping().await,
            Err(DirectoryError::Backend(_))
        ));
    }
}
