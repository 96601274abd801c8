//! # Document records
//!
//! A [`DocumentRecord`] is the sole persistent entity in the system: one
//! uploaded file, its storage URL, the identity that owns it, and the set of
//! identities granted read access.
//!
//! ## Trust model
//!
//! The hosted backend is assumed to scope reads server-side; the record
//! carries everything needed for the client to additionally self-filter
//! (see [`crate::access`]). Ownership is fixed at creation and never
//! transferred. Only the owner may delete a record or mutate its grantee
//! set; that rule is enforced by [`crate::directory::Directory`], not here.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An opaque identity handed out by the auth backend.
///
/// The client never parses these; one backend issues UUIDs, the other
/// issues its own id format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An opaque record identifier, assigned by the storage backend at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One stored document: owner, storage URL, display name, and grantee set.
///
/// `id`, `owner`, `url`, `file_name` and `uploaded_at` are immutable after
/// creation. `shared_with` is mutated only through owner-initiated
/// grant/revoke. A `BTreeSet` keeps iteration order stable for a fixed
/// input, so callers never depend on server ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocId,
    pub owner: UserId,
    pub url: String,
    pub file_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    #[serde(default)]
    pub shared_with: BTreeSet<UserId>,
}

impl DocumentRecord {
    pub fn is_owned_by(&self, identity: &UserId) -> bool {
        &self.owner == identity
    }

    pub fn grants(&self, identity: &UserId) -> bool {
        self.shared_with.contains(identity)
    }

    /// The visibility rule: owner or grantee.
    pub fn visible_to(&self, identity: &UserId) -> bool {
        self.is_owned_by(identity) || self.grants(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, shared: &[&str]) -> DocumentRecord {
        DocumentRecord {
            id: DocId::from("d1"),
            owner: UserId::from(owner),
            url: "https://store.example/d1".to_string(),
            file_name: "report.pdf".to_string(),
            uploaded_at: OffsetDateTime::UNIX_EPOCH,
            shared_with: shared.iter().map(|s| UserId::from(*s)).collect(),
        }
    }

    #[test]
    fn owner_is_visible() {
        let r = record("alice", &[]);
        assert!(r.visible_to(&UserId::from("alice")));
        assert!(!r.visible_to(&UserId::from("bob")));
    }

    #[test]
    fn grantee_is_visible() {
        let r = record("alice", &["bob"]);
        assert!(r.visible_to(&UserId::from("bob")));
        assert!(!r.visible_to(&UserId::from("carol")));
    }

    #[test]
    fn grantee_set_dedupes() {
        let r = record("alice", &["bob", "bob"]);
        assert_eq!(r.shared_with.len(), 1);
    }

    #[test]
    fn serde_round_trip_keeps_fields() {
        let r = record("alice", &["bob"]);
        let json = serde_json::to_string(&r).unwrap();
        let back: DocumentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
