//! Integration tests for record creation and deletion

mod support;

use common::directory::DirectoryError;

#[tokio::test]
async fn test_insert_creates_record_with_empty_grantees() {
    let (directory, alice, _) = support::setup_directory();

    let doc = support::seed_record(&directory, &alice, "report.pdf").await;
    assert_eq!(doc.owner, alice);
    assert_eq!(doc.file_name, "report.pdf");
    assert!(doc.shared_with.is_empty());

    let stored = directory.get(&doc.id).await.unwrap();
    assert_eq!(stored, doc);
}

#[tokio::test]
async fn test_owner_can_delete() {
    let (directory, alice, _) = support::setup_directory();
    let doc = support::seed_record(&directory, &alice, "report.pdf").await;

    directory.delete(&doc.id, &alice).await.unwrap();
    assert!(matches!(
        directory.get(&doc.id).await,
        Err(DirectoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_non_owner_delete_leaves_record_in_place() {
    let (directory, alice, bob) = support::setup_directory();
    let doc = support::seed_record(&directory, &alice, "report.pdf").await;

    let result = directory.delete(&doc.id, &bob).await;
    assert!(matches!(result, Err(DirectoryError::NotOwner)));

    // Still present at the backend
    assert!(directory.get(&doc.id).await.is_ok());
}

#[tokio::test]
async fn test_grantee_cannot_delete() {
    let (directory, alice, bob) = support::setup_directory();
    let doc = support::seed_record(&directory, &alice, "report.pdf").await;
    directory.grant(&doc.id, &alice, &bob).await.unwrap();

    let result = directory.delete(&doc.id, &bob).await;
    assert!(matches!(result, Err(DirectoryError::NotOwner)));
}

#[tokio::test]
async fn test_delete_missing_record() {
    let (directory, alice, _) = support::setup_directory();

    let result = directory
        .delete(&common::document::DocId::from("doc-404"), &alice)
        .await;
    assert!(matches!(result, Err(DirectoryError::NotFound(_))));
}
