//! Integration tests for the live subscription surface

mod support;

use common::testkit;

#[tokio::test]
async fn test_subscription_delivers_on_every_mutation() {
    let (directory, alice, bob) = support::setup_directory();
    let mut watch = directory.subscribe(&alice).await.unwrap();

    let doc = support::seed_record(&directory, &alice, "a.txt").await;
    watch.changed().await.unwrap();
    assert_eq!(watch.current().len(), 1);

    directory.grant(&doc.id, &alice, &bob).await.unwrap();
    watch.changed().await.unwrap();
    assert!(watch.current()[0].grants(&bob));

    directory.delete(&doc.id, &alice).await.unwrap();
    watch.changed().await.unwrap();
    assert!(watch.current().is_empty());
}

#[tokio::test]
async fn test_subscription_is_identity_scoped() {
    let (directory, alice, bob) = support::setup_directory();
    let mut alice_watch = directory.subscribe(&alice).await.unwrap();
    let mut bob_watch = directory.subscribe(&bob).await.unwrap();

    support::seed_record(&directory, &alice, "a.txt").await;
    alice_watch.changed().await.unwrap();
    bob_watch.changed().await.unwrap();

    // Both subscriptions observed the mutation, but only the owner sees
    // the record
    assert_eq!(alice_watch.current().len(), 1);
    assert!(bob_watch.current().is_empty());
}

#[tokio::test]
async fn test_new_identity_sees_different_subset_of_same_feed() {
    let (directory, alice, bob) = support::setup_directory();
    let carol = testkit::user("carol");

    let doc = support::seed_record(&directory, &alice, "a.txt").await;
    directory.grant(&doc.id, &alice, &bob).await.unwrap();

    // Re-subscription under a different identity, as the app does when the
    // resolved identity changes
    let bob_watch = directory.subscribe(&bob).await.unwrap();
    let carol_watch = directory.subscribe(&carol).await.unwrap();

    assert_eq!(bob_watch.current().len(), 1);
    assert!(carol_watch.current().is_empty());
}

#[tokio::test]
async fn test_grant_propagates_to_grantee_subscription() {
    let (directory, alice, bob) = support::setup_directory();
    let doc = support::seed_record(&directory, &alice, "a.txt").await;

    let mut bob_watch = directory.subscribe(&bob).await.unwrap();
    assert!(bob_watch.current().is_empty());

    directory.grant(&doc.id, &alice, &bob).await.unwrap();
    bob_watch.changed().await.unwrap();
    assert_eq!(bob_watch.current().len(), 1);

    directory.revoke(&doc.id, &alice, &bob).await.unwrap();
    bob_watch.changed().await.unwrap();
    assert!(bob_watch.current().is_empty());
}
