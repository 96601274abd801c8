//! Integration tests for the object-store upload client against a stub
//! endpoint

use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use common::storage::{ObjectStoreClient, UploadError};
use url::Url;

async fn spawn_stub(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{}/upload", addr)).unwrap()
}

/// An address nothing listens on.
async fn dead_endpoint() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/upload", addr)).unwrap()
}

#[tokio::test]
async fn test_upload_returns_retrieval_url() {
    let endpoint = spawn_stub(Router::new().route(
        "/upload",
        post(|| async {
            Json(serde_json::json!({
                "secure_url": "https://store.example/v1/report.pdf"
            }))
        }),
    ))
    .await;

    let client = ObjectStoreClient::new(endpoint, "docs_unsigned");
    let url = client
        .upload("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(url.as_str(), "https://store.example/v1/report.pdf");
}

#[tokio::test]
async fn test_rejected_upload_surfaces_backend_message() {
    let endpoint = spawn_stub(Router::new().route(
        "/upload",
        post(|| async {
            (
                axum::http::StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": { "message": "Upload preset not found" }
                })),
            )
        }),
    ))
    .await;

    let client = ObjectStoreClient::new(endpoint, "docs_unsigned");
    let result = client
        .upload("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await;

    match result {
        Err(UploadError::Rejected { reason }) => {
            assert_eq!(reason, "Upload preset not found")
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_error_is_surfaced() {
    let client = ObjectStoreClient::new(dead_endpoint().await, "docs_unsigned");
    let result = client
        .upload("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await;
    assert!(matches!(result, Err(UploadError::Transport(_))));
}

#[tokio::test]
async fn test_success_without_url_is_an_error() {
    let endpoint = spawn_stub(Router::new().route(
        "/upload",
        post(|| async { Json(serde_json::json!({ "public_id": "report" })) }),
    ))
    .await;

    let client = ObjectStoreClient::new(endpoint, "docs_unsigned");
    let result = client
        .upload("report.pdf", Bytes::from_static(b"%PDF-1.4"))
        .await;
    assert!(matches!(result, Err(UploadError::MissingUrl)));
}
