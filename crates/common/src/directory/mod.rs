use std::fmt::{Debug, Display};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::access::visible;
use crate::document::{DocId, DocumentRecord, UserId};

pub mod document;
pub mod memory;
pub mod relational;

pub use document::DocumentDirectoryProvider;
pub use memory::MemoryDirectoryProvider;
pub use relational::RelationalDirectoryProvider;

/// How often the remote providers re-fetch the record set for their
/// change feeds. The hosted backends push on a websocket; here the same
/// full-set-on-change contract is kept over poll-and-diff.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(thiserror::Error, Debug)]
pub enum DirectoryError<E> {
    /// The backend reported a failure the directory cannot interpret
    #[error("unhandled directory provider error: {0}")]
    Provider(#[from] E),
    /// No record with this id exists at the backend
    #[error("no such document: {0}")]
    NotFound(DocId),
    /// The caller does not own the record it tried to mutate
    #[error("only the document owner may do that")]
    NotOwner,
    /// An owner tried to grant itself access
    #[error("a document cannot be shared with its owner")]
    InvalidGrantee,
}

/// Raw storage operations against one of the hosted directory backends.
///
/// Providers implement the unguarded primitives; ownership checks live in
/// [`Directory`], so both dialects share one authorization path. Grantee
/// mutation must have set semantics: adding a present grantee or removing
/// an absent one is a no-op, never an error.
#[async_trait]
pub trait DirectoryProvider: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync;

    /// Fetch a single record by id.
    ///
    /// # Returns
    /// * `Ok(record)` - The record as currently stored
    /// * `Err(DirectoryError::NotFound)` - No record with this id
    async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<Self::Error>>;

    /// Create a record with an empty grantee set.
    ///
    /// The backend assigns the id and the creation timestamp. There is no
    /// uniqueness constraint on (owner, file_name); inserting the same name
    /// twice yields two records.
    async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<Self::Error>>;

    /// Remove a record unconditionally.
    async fn remove(&self, id: &DocId) -> Result<(), DirectoryError<Self::Error>>;

    /// Add an identity to the record's grantee set (idempotent).
    async fn add_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>>;

    /// Remove an identity from the record's grantee set (idempotent).
    async fn remove_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>>;

    /// Fetch the complete record set, globally scoped.
    ///
    /// The hosted backends are assumed to scope reads server-side; callers
    /// must still self-filter before display (see [`crate::access`]).
    async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<Self::Error>>;

    /// Open the live change feed: the complete current record set,
    /// re-delivered on every insert/delete/update anywhere in the directory.
    ///
    /// Dropping the returned feed closes the subscription; exactly one
    /// should be active at a time.
    async fn subscribe(&self) -> Result<DirectoryFeed, DirectoryError<Self::Error>>;
}

/// A live, globally-scoped feed of the full record set.
#[derive(Debug)]
pub struct DirectoryFeed {
    rx: watch::Receiver<Vec<DocumentRecord>>,
    task: Option<FeedTask>,
}

/// Poll task behind a remote feed; aborted when the feed is dropped.
#[derive(Debug)]
struct FeedTask(tokio::task::JoinHandle<()>);

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl DirectoryFeed {
    /// Feed backed directly by a provider-held channel (memory backend).
    pub fn from_receiver(rx: watch::Receiver<Vec<DocumentRecord>>) -> Self {
        Self { rx, task: None }
    }

    /// Feed backed by a background poll task (remote backends).
    pub fn with_task(
        rx: watch::Receiver<Vec<DocumentRecord>>,
        task: tokio::task::JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            task: Some(FeedTask(task)),
        }
    }

    /// Wait for the next re-delivery.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// The most recently delivered record set.
    pub fn latest(&self) -> Vec<DocumentRecord> {
        self.rx.borrow().clone()
    }
}

/// An identity-scoped subscription: the same feed, filtered down to the
/// records the identity may see. Must be re-established whenever the
/// resolved identity changes.
#[derive(Debug)]
pub struct DocumentWatch {
    feed: DirectoryFeed,
    identity: UserId,
}

impl DocumentWatch {
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.feed.changed().await
    }

    /// The currently visible records for this subscription's identity.
    pub fn current(&self) -> Vec<DocumentRecord> {
        visible(&self.feed.latest(), &self.identity)
    }

    pub fn identity(&self) -> &UserId {
        &self.identity
    }
}

/// The document directory: guarded operations over a backend provider.
///
/// Every mutation requires a resolved identity (`caller`); delete and
/// grant/revoke are refused unless the caller owns the record.
#[derive(Debug, Clone)]
pub struct Directory<P: DirectoryProvider> {
    provider: P,
}

impl<P: DirectoryProvider> Directory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Record a freshly uploaded document for `owner`.
    pub async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<P::Error>> {
        self.provider.insert(owner, url, file_name).await
    }

    /// Delete a record. Refused with `NotOwner` unless `caller` owns it.
    pub async fn delete(
        &self,
        id: &DocId,
        caller: &UserId,
    ) -> Result<(), DirectoryError<P::Error>> {
        let record = self.provider.get(id).await?;
        if !record.is_owned_by(caller) {
            return Err(DirectoryError::NotOwner);
        }
        self.provider.remove(id).await
    }

    /// Grant `grantee` read access. Refused with `NotOwner` unless `caller`
    /// owns the record, and with `InvalidGrantee` for self-shares. Granting
    /// an existing grantee is a no-op.
    pub async fn grant(
        &self,
        id: &DocId,
        caller: &UserId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<P::Error>> {
        let record = self.provider.get(id).await?;
        if !record.is_owned_by(caller) {
            return Err(DirectoryError::NotOwner);
        }
        if grantee == caller {
            return Err(DirectoryError::InvalidGrantee);
        }
        self.provider.add_grantee(id, grantee).await
    }

    /// Revoke `grantee`'s read access. Refused with `NotOwner` unless
    /// `caller` owns the record. Revoking an absent grantee is a no-op.
    pub async fn revoke(
        &self,
        id: &DocId,
        caller: &UserId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<P::Error>> {
        let record = self.provider.get(id).await?;
        if !record.is_owned_by(caller) {
            return Err(DirectoryError::NotOwner);
        }
        self.provider.remove_grantee(id, grantee).await
    }

    pub async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<P::Error>> {
        self.provider.get(id).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<P::Error>> {
        self.provider.fetch_all().await
    }

    /// Records currently visible to `identity`.
    pub async fn fetch_visible(
        &self,
        identity: &UserId,
    ) -> Result<Vec<DocumentRecord>, DirectoryError<P::Error>> {
        Ok(visible(&self.provider.fetch_all().await?, identity))
    }

    /// Open an identity-scoped live subscription.
    pub async fn subscribe(
        &self,
        identity: &UserId,
    ) -> Result<DocumentWatch, DirectoryError<P::Error>> {
        Ok(DocumentWatch {
            feed: self.provider.subscribe().await?,
            identity: identity.clone(),
        })
    }
}
