use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{command_error_status, DocumentView};
use crate::http_server::api::client::ApiRequest;
use crate::{CommandError, ServiceState};

/// Client-side request: the blob travels as a multipart `file` field, the
/// same shape the browser form submits.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document: DocumentView,
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let mut file: Option<(String, bytes::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Payload(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| UploadError::Payload(e.to_string()))?;
            file = Some((file_name, data));
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| UploadError::Payload("missing file field".to_string()))?;

    let record = state.upload_document(&file_name, data).await?;

    Ok((
        http::StatusCode::CREATED,
        Json(UploadResponse {
            document: record.into(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Payload(msg) => {
                (http::StatusCode::BAD_REQUEST, format!("Error: {}", msg)).into_response()
            }
            UploadError::Command(e) => {
                (command_error_status(&e), format!("Error: {}", e)).into_response()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for UploadRequest {
    type Response = UploadResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/docs/upload").unwrap();
        let part = reqwest::multipart::Part::bytes(self.data).file_name(self.file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        client.post(full_url).multipart(form)
    }
}
