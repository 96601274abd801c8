//! Shared test utilities for directory integration tests
#![allow(dead_code)]

use common::directory::{Directory, MemoryDirectoryProvider};
use common::document::{DocumentRecord, UserId};
use common::testkit;

/// Set up a memory-backed directory with two well-known identities.
pub fn setup_directory() -> (Directory<MemoryDirectoryProvider>, UserId, UserId) {
    let directory = testkit::directory();
    (directory, testkit::user("alice"), testkit::user("bob"))
}

/// Insert a record owned by `owner` and return it.
pub async fn seed_record(
    directory: &Directory<MemoryDirectoryProvider>,
    owner: &UserId,
    file_name: &str,
) -> DocumentRecord {
    directory
        .insert(
            owner,
            &format!("https://store.example/{}", file_name),
            file_name,
        )
        .await
        .unwrap()
}
