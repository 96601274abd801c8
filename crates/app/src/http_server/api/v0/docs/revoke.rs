use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::document::{DocId, UserId};

use super::{command_error_status, DocumentView};
use crate::http_server::api::client::ApiRequest;
use crate::{CommandError, ServiceState};

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RevokeRequest {
    /// Id of the document to revoke access on
    #[arg(long)]
    pub id: String,
    /// Identity whose read access is revoked
    #[arg(long)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub document: DocumentView,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<RevokeRequest>,
) -> Result<impl IntoResponse, RevokeError> {
    let id = DocId::from(req.id.as_str());
    let grantee = UserId::from(req.user_id.as_str());
    let record = state.revoke_access(&id, &grantee).await?;

    Ok((
        http::StatusCode::OK,
        Json(RevokeResponse {
            document: record.into(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for RevokeError {
    fn into_response(self) -> Response {
        match self {
            RevokeError::Command(e) => {
                (command_error_status(&e), format!("Error: {}", e)).into_response()
            }
        }
    }
}

impl ApiRequest for RevokeRequest {
    type Response = RevokeResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/docs/revoke").unwrap();
        client.post(full_url).json(&self)
    }
}
