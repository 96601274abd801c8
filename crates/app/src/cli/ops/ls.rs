use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::docs::list::{ListRequest, ListResponse};

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ListRequest {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ListResponse = client.call(self.clone()).await?;

        if response.documents.is_empty() {
            return Ok("No documents uploaded or shared with you yet.".to_string());
        }

        let mut out = format!("Documents visible to {}:\n", response.user_id);
        for doc in &response.documents {
            out.push_str(&format!(
                "  {}  {}  {}  [shared with {}]\n",
                doc.id,
                doc.file_name,
                doc.url,
                doc.shared_with.len()
            ));
        }
        Ok(out.trim_end().to_string())
    }
}
