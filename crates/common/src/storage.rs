use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Client for the unsigned object-storage upload endpoint.
///
/// One multipart POST per upload: the raw blob under `file` plus the
/// `upload_preset` naming the unsigned upload policy. No retry, no
/// chunking, no resumability; on any failure the caller must not record a
/// directory entry for the blob.
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    client: Client,
    endpoint: Url,
    upload_preset: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upload failed: {reason}")]
    Rejected { reason: String },
    #[error("upload failed: response carried no retrieval URL")]
    MissingUrl,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<Url>,
    #[serde(default)]
    error: Option<UploadResponseError>,
}

#[derive(Debug, Deserialize)]
struct UploadResponseError {
    message: String,
}

impl ObjectStoreClient {
    pub fn new(endpoint: Url, upload_preset: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            upload_preset: upload_preset.into(),
        }
    }

    /// Upload one blob, returning its permanent retrieval URL.
    pub async fn upload(&self, file_name: &str, data: Bytes) -> Result<Url, UploadError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<UploadResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("{}: {}", status, text));
            return Err(UploadError::Rejected { reason });
        }

        let body: UploadResponse = response.json().await?;
        body.secure_url.ok_or(UploadError::MissingUrl)
    }
}
