//! In-process directory, for embedding and tests.

use super::{DirectoryError, UserDirectory};
use crate::identity::IdentityRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: RwLock<HashMap<String, IdentityRecord>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision (or replace) a record. The access token is never stored.
    pub async fn insert(&self, record: IdentityRecord) {
        let mut stored = record;
        stored.access_token.clear();
        self.records.write().await.insert(stored.id.clone(), stored);
    }

    pub async fn get(&self, id: &str) -> Option<IdentityRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>, DirectoryError> {
        Ok(self.get(id).await)
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<IdentityRecord>, DirectoryError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.refresh_token == token)
            .cloned())
    }

    async fn compare_and_swap_refresh_token(
        &self,
        id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, DirectoryError> {
        // Compare and write under one write guard.
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) if record.refresh_token == expected => {
                record.refresh_token = new.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn directory() -> MemoryDirectory {
        let directory = MemoryDirectory::new();
        directory
            .insert(IdentityRecord::new("u1", "Ada").with_refresh_token("r0"))
            .await;
        directory
    }

    #[tokio::test]
    async fn finds_by_id_and_token() -> Result<(), DirectoryError> {
        let directory = directory().await;
        assert!(directory.find_by_id("u1").await?.is_some());
        assert!(directory.find_by_id("u2").await?.is_none());
        assert_eq!(
            directory
                .find_by_refresh_token("r0")
                .await?
                .map(|record| record.id),
            Some("u1".to_string())
        );
        assert!(directory.find_by_refresh_token("").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn swap_requires_matching_value() -> Result<(), DirectoryError> {
        let directory = directory().await;
        assert!(
            !directory
                .compare_and_swap_refresh_token("u1", "nope", "r1")
                .await?
        );
        assert!(
            directory
                .compare_and_swap_refresh_token("u1", "r0", "r1")
                .await?
        );
        assert!(
            !directory
                .compare_and_swap_refresh_token("u1", "r0", "r2")
                .await?
        );
        assert!(
            !directory
                .compare_and_swap_refresh_token("u2", "r1", "r2")
                .await?
        );
        assert_eq!(
            directory.get("u1").await.map(|record| record.refresh_token),
            Some("r1".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn insert_drops_access_token() {
        let directory = MemoryDirectory::new();
        let mut record = IdentityRecord::new("u1", "Ada");
        record.access_token = "a0".to_string();
        directory.insert(record).await;
        assert_eq!(
            directory.get("u1").await.map(|record| record.access_token),
            Some(String::new())
        );
    }
}
