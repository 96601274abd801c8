use std::path::PathBuf;

use clap::Args;

use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::docs::upload::{UploadRequest, UploadResponse};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Path of the file to upload
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("path has no usable file name: {0}")]
    BadFileName(PathBuf),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| UploadError::Read {
                path: self.path.clone(),
                source,
            })?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| UploadError::BadFileName(self.path.clone()))?;

        let mut client = ctx.client.clone();
        let response: UploadResponse = client.call(UploadRequest { file_name, data }).await?;

        Ok(format!(
            "Uploaded {} -> {}",
            response.document.file_name, response.document.url
        ))
    }
}
