use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::docs::delete::{DeleteRequest, DeleteResponse};

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for DeleteRequest {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: DeleteResponse = client.call(self.clone()).await?;

        Ok(format!("Deleted document {}", response.id))
    }
}
