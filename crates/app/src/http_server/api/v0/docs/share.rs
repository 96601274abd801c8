use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::document::{DocId, UserId};

use super::{command_error_status, DocumentView};
use crate::http_server::api::client::ApiRequest;
use crate::{CommandError, ServiceState};

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ShareRequest {
    /// Id of the document to share
    #[arg(long)]
    pub id: String,
    /// Identity to grant read access to
    #[arg(long)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub document: DocumentView,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, ShareError> {
    let id = DocId::from(req.id.as_str());
    let grantee = UserId::from(req.user_id.as_str());
    let record = state.share_document(&id, &grantee).await?;

    Ok((
        http::StatusCode::OK,
        Json(ShareResponse {
            document: record.into(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        match self {
            ShareError::Command(e) => {
                (command_error_status(&e), format!("Error: {}", e)).into_response()
            }
        }
    }
}

impl ApiRequest for ShareRequest {
    type Response = ShareResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/docs/share").unwrap();
        client.post(full_url).json(&self)
    }
}
