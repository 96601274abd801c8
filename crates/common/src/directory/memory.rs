use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::watch;

use super::{DirectoryError, DirectoryFeed, DirectoryProvider};
use crate::document::{DocId, DocumentRecord, UserId};

/// In-memory directory provider using a BTreeMap
///
/// Backs the tests and the `memory` backend for local development. The
/// change feed is a watch channel re-sent on every mutation, so it has the
/// same full-set-on-change shape as the hosted feeds.
#[derive(Debug, Clone)]
pub struct MemoryDirectoryProvider {
    inner: Arc<RwLock<MemoryDirectoryProviderInner>>,
    feed: Arc<watch::Sender<Vec<DocumentRecord>>>,
}

#[derive(Debug, Default)]
struct MemoryDirectoryProviderInner {
    /// Records keyed by id; BTreeMap keeps enumeration order stable
    records: BTreeMap<DocId, DocumentRecord>,
    /// Counter backing the "server-assigned" ids
    next_id: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum MemoryDirectoryProviderError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryDirectoryProvider {
    pub fn new() -> Self {
        let (feed, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(RwLock::new(MemoryDirectoryProviderInner::default())),
            feed: Arc::new(feed),
        }
    }

    fn read_lock(
        &self,
    ) -> Result<
        std::sync::RwLockReadGuard<'_, MemoryDirectoryProviderInner>,
        DirectoryError<MemoryDirectoryProviderError>,
    > {
        self.inner.read().map_err(|e| {
            DirectoryError::Provider(MemoryDirectoryProviderError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write_lock(
        &self,
    ) -> Result<
        std::sync::RwLockWriteGuard<'_, MemoryDirectoryProviderInner>,
        DirectoryError<MemoryDirectoryProviderError>,
    > {
        self.inner.write().map_err(|e| {
            DirectoryError::Provider(MemoryDirectoryProviderError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }

    fn publish(&self, inner: &MemoryDirectoryProviderInner) {
        // Receivers may not exist yet; that is fine
        let _ = self.feed.send(inner.records.values().cloned().collect());
    }
}

impl Default for MemoryDirectoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryProvider for MemoryDirectoryProvider {
    type Error = MemoryDirectoryProviderError;

    async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let inner = self.read_lock()?;
        inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }

    async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let mut inner = self.write_lock()?;

        inner.next_id += 1;
        let id = DocId::new(format!("doc-{}", inner.next_id));

        let record = DocumentRecord {
            id: id.clone(),
            owner: owner.clone(),
            url: url.to_string(),
            file_name: file_name.to_string(),
            uploaded_at: OffsetDateTime::now_utc(),
            shared_with: Default::default(),
        };
        inner.records.insert(id, record.clone());

        self.publish(&inner);
        Ok(record)
    }

    async fn remove(&self, id: &DocId) -> Result<(), DirectoryError<Self::Error>> {
        let mut inner = self.write_lock()?;
        inner
            .records
            .remove(id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))?;

        self.publish(&inner);
        Ok(())
    }

    async fn add_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        let mut inner = self.write_lock()?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))?;

        // Set semantics: a duplicate grant is absorbed
        record.shared_with.insert(grantee.clone());

        self.publish(&inner);
        Ok(())
    }

    async fn remove_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        let mut inner = self.write_lock()?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))?;

        // No-op if the grantee was never present
        record.shared_with.remove(grantee);

        self.publish(&inner);
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<Self::Error>> {
        let inner = self.read_lock()?;
        Ok(inner.records.values().cloned().collect())
    }

    async fn subscribe(&self) -> Result<DirectoryFeed, DirectoryError<Self::Error>> {
        Ok(DirectoryFeed::from_receiver(self.feed.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_and_empty_grantees() {
        let provider = MemoryDirectoryProvider::new();
        let owner = UserId::from("alice");

        let record = provider
            .insert(&owner, "https://store.example/a", "a.txt")
            .await
            .unwrap();

        assert_eq!(record.owner, owner);
        assert!(record.shared_with.is_empty());
        assert_eq!(provider.get(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let provider = MemoryDirectoryProvider::new();
        let result = provider.get(&DocId::from("doc-404")).await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_grantee_set_semantics() {
        let provider = MemoryDirectoryProvider::new();
        let owner = UserId::from("alice");
        let bob = UserId::from("bob");

        let record = provider
            .insert(&owner, "https://store.example/a", "a.txt")
            .await
            .unwrap();

        provider.add_grantee(&record.id, &bob).await.unwrap();
        provider.add_grantee(&record.id, &bob).await.unwrap();
        assert_eq!(provider.get(&record.id).await.unwrap().shared_with.len(), 1);

        provider.remove_grantee(&record.id, &bob).await.unwrap();
        provider.remove_grantee(&record.id, &bob).await.unwrap();
        assert!(provider
            .get(&record.id)
            .await
            .unwrap()
            .shared_with
            .is_empty());
    }

    #[tokio::test]
    async fn test_feed_redelivers_full_set() {
        let provider = MemoryDirectoryProvider::new();
        let owner = UserId::from("alice");
        let mut feed = provider.subscribe().await.unwrap();

        provider
            .insert(&owner, "https://store.example/a", "a.txt")
            .await
            .unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.latest().len(), 1);

        let second = provider
            .insert(&owner, "https://store.example/b", "b.txt")
            .await
            .unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.latest().len(), 2);

        provider.remove(&second.id).await.unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.latest().len(), 1);
    }

    #[tokio::test]
    async fn test_no_uniqueness_on_owner_and_name() {
        let provider = MemoryDirectoryProvider::new();
        let owner = UserId::from("alice");

        let first = provider
            .insert(&owner, "https://store.example/a", "a.txt")
            .await
            .unwrap();
        let second = provider
            .insert(&owner, "https://store.example/a", "a.txt")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(provider.fetch_all().await.unwrap().len(), 2);
    }
}
