use docshelf_app::http_server::api::client::ApiError;
use docshelf_app::http_server::api::v0::session::whoami::{WhoamiRequest, WhoamiResponse};

#[derive(Debug, thiserror::Error)]
pub enum WhoamiError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for WhoamiRequest {
    type Error = WhoamiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: WhoamiResponse = client.call(self.clone()).await?;

        Ok(match response {
            WhoamiResponse {
                user_id: Some(id), ..
            } => format!("Signed in as {}", id),
            WhoamiResponse {
                resolved: false, ..
            } => "Session still resolving".to_string(),
            WhoamiResponse {
                reason: Some(reason),
                ..
            } => format!("No identity available: {}", reason),
            _ => "No identity available".to_string(),
        })
    }
}
