use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::document::DocId;

use super::command_error_status;
use crate::http_server::api::client::ApiRequest;
use crate::{CommandError, ServiceState};

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeleteRequest {
    /// Id of the document to delete
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<DeleteRequest>,
) -> Result<impl IntoResponse, DeleteError> {
    let id = DocId::from(req.id.as_str());
    state.delete_document(&id).await?;

    Ok((
        http::StatusCode::OK,
        Json(DeleteResponse { id: req.id }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for DeleteError {
    fn into_response(self) -> Response {
        match self {
            DeleteError::Command(e) => {
                (command_error_status(&e), format!("Error: {}", e)).into_response()
            }
        }
    }
}

impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/docs/delete").unwrap();
        client.post(full_url).json(&self)
    }
}
