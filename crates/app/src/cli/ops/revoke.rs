use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::docs::revoke::{RevokeRequest, RevokeResponse};

#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for RevokeRequest {
    type Error = RevokeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: RevokeResponse = client.call(self.clone()).await?;

        Ok(format!(
            "Access revoked for '{}' on document '{}'. Now readable by {} user(s).",
            self.user_id,
            response.document.file_name,
            response.document.shared_with.len()
        ))
    }
}
