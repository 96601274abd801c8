//! End-to-end command tests over a memory-backed service state

use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use url::Url;

use common::directory::DirectoryError;
use common::document::UserId;
use docshelf_app::state::{AuthConfig, BackendConfig, ObjectStoreConfig};
use docshelf_app::{CommandError, ServiceConfig, ServiceState};

fn test_config(upload_url: Url) -> ServiceConfig {
    ServiceConfig {
        backend: BackendConfig::Memory,
        auth: AuthConfig::Memory,
        object_store: ObjectStoreConfig {
            upload_url,
            upload_preset: "docs_unsigned".to_string(),
        },
        app_port: 0,
        log_level: tracing::Level::DEBUG,
        log_dir: None,
    }
}

/// A stub object store that accepts everything.
async fn stub_store() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route(
        "/upload",
        post(|| async {
            Json(serde_json::json!({
                "secure_url": "https://store.example/v1/report.pdf"
            }))
        }),
    );
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{}/upload", addr)).unwrap()
}

/// An endpoint nothing listens on, to simulate a transport failure.
async fn dead_store() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/upload", addr)).unwrap()
}

#[tokio::test]
async fn test_failed_upload_records_nothing() {
    let state = ServiceState::from_config(&test_config(dead_store().await)).unwrap();
    state.session().resolve().await.unwrap();

    let result = state
        .upload_document("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await;
    assert!(matches!(result, Err(CommandError::Upload(_))));

    // No insert happened; the directory is unchanged
    assert!(state.directory().fetch_all().await.unwrap().is_empty());

    // UI is back to interactive idle with the failure surfaced
    let ui = state.ui().read().clone();
    assert!(!ui.is_uploading());
    assert!(ui.message().unwrap().contains("Failed to upload document"));
    assert!(ui.last_uploaded().is_none());
}

#[tokio::test]
async fn test_successful_upload_records_exactly_one_document() {
    let state = ServiceState::from_config(&test_config(stub_store().await)).unwrap();
    let session = state.session().resolve().await.unwrap();

    let record = state
        .upload_document("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await
        .unwrap();

    assert_eq!(record.owner, session.user_id);
    assert_eq!(record.file_name, "report.pdf");
    assert_eq!(record.url, "https://store.example/v1/report.pdf");
    assert!(record.shared_with.is_empty());

    let all = state.directory().fetch_all().await.unwrap();
    assert_eq!(all, vec![record]);

    let ui = state.ui().read().clone();
    assert_eq!(ui.message(), Some("Document uploaded successfully!"));
    assert_eq!(
        ui.last_uploaded(),
        Some("https://store.example/v1/report.pdf")
    );
}

#[tokio::test]
async fn test_delete_of_foreign_record_is_refused() {
    let state = ServiceState::from_config(&test_config(stub_store().await)).unwrap();
    state.session().resolve().await.unwrap();

    // A record owned by some other identity, visible only at the backend
    let other = UserId::from("somebody-else");
    let foreign = state
        .directory()
        .insert(&other, "https://store.example/x", "theirs.txt")
        .await
        .unwrap();

    let result = state.delete_document(&foreign.id).await;
    assert!(matches!(
        result,
        Err(CommandError::Directory(DirectoryError::NotOwner))
    ));

    // Still present at the backend
    assert!(state.directory().get(&foreign.id).await.is_ok());
}

#[tokio::test]
async fn test_share_then_revoke_round_trip() {
    let state = ServiceState::from_config(&test_config(stub_store().await)).unwrap();
    state.session().resolve().await.unwrap();
    let bob = UserId::from("bob");

    let record = state
        .upload_document("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await
        .unwrap();

    let shared = state.share_document(&record.id, &bob).await.unwrap();
    assert!(shared.grants(&bob));

    let revoked = state.revoke_access(&record.id, &bob).await.unwrap();
    assert!(!revoked.grants(&bob));
}
