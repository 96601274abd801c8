/// Lightweight fixtures for directory and session tests
///
/// Everything here is memory-backed; no external service is required.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit;
///
/// #[tokio::test]
/// async fn test_owner_can_share() -> anyhow::Result<()> {
///     let directory = testkit::directory();
///     let alice = testkit::user("alice");
///     let bob = testkit::user("bob");
///
///     let doc = directory.insert(&alice, "https://store.example/a", "a.txt").await?;
///     directory.grant(&doc.id, &alice, &bob).await?;
///     Ok(())
/// }
/// ```
use time::OffsetDateTime;

use crate::directory::{Directory, MemoryDirectoryProvider};
use crate::document::{DocId, DocumentRecord, UserId};

/// A deterministic identity for tests.
pub fn user(name: &str) -> UserId {
    UserId::new(name)
}

/// A record literal for pure-function tests.
pub fn record(id: &str, owner: &UserId, grantees: &[&UserId]) -> DocumentRecord {
    DocumentRecord {
        id: DocId::new(id),
        owner: owner.clone(),
        url: format!("https://store.example/{}", id),
        file_name: format!("{}.txt", id),
        uploaded_at: OffsetDateTime::UNIX_EPOCH,
        shared_with: grantees.iter().map(|u| (*u).clone()).collect(),
    }
}

/// A fresh memory-backed directory.
pub fn directory() -> Directory<MemoryDirectoryProvider> {
    Directory::new(MemoryDirectoryProvider::new())
}
