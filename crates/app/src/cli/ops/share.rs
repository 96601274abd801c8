use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::docs::share::{ShareRequest, ShareResponse};

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ShareRequest {
    type Error = ShareError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ShareResponse = client.call(self.clone()).await?;

        Ok(format!(
            "Document '{}' shared with '{}'. Now readable by {} user(s).",
            response.document.file_name,
            self.user_id,
            response.document.shared_with.len()
        ))
    }
}
