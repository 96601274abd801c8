use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::access::visible;

use super::{command_error_status, DocumentView};
use crate::http_server::api::client::ApiRequest;
use crate::{CommandError, ServiceState};

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub user_id: String,
    pub documents: Vec<DocumentView>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    let identity = state.identity().ok_or(ListError::NotReady)?;

    // Authoritative fetch; the caller self-filters the globally-scoped set
    let records = state
        .directory()
        .fetch_all()
        .await
        .map_err(CommandError::from)?;
    let documents = visible(&records, &identity)
        .into_iter()
        .map(DocumentView::from)
        .collect();

    Ok((
        http::StatusCode::OK,
        Json(ListResponse {
            user_id: identity.to_string(),
            documents,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("App not fully initialized. Please wait.")]
    NotReady,
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::NotReady => {
                (http::StatusCode::SERVICE_UNAVAILABLE, format!("Error: {}", self)).into_response()
            }
            ListError::Command(e) => {
                (command_error_status(&e), format!("Error: {}", e)).into_response()
            }
        }
    }
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/docs/list").unwrap();
        client.post(full_url).json(&self)
    }
}
