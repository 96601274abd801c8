use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::session::SessionState;

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct WhoamiRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoamiResponse {
    /// The resolved identity, if any
    pub user_id: Option<String>,
    /// False while session establishment is still in flight
    pub resolved: bool,
    /// Why the identity is absent, when it is
    pub reason: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<WhoamiRequest>,
) -> impl IntoResponse {
    let response = match state.session().state() {
        SessionState::Ready(session) => WhoamiResponse {
            user_id: Some(session.user_id.to_string()),
            resolved: true,
            reason: None,
        },
        SessionState::Resolving => WhoamiResponse {
            user_id: None,
            resolved: false,
            reason: None,
        },
        SessionState::Unavailable { reason } => WhoamiResponse {
            user_id: None,
            resolved: true,
            reason: Some(reason),
        },
    };

    (http::StatusCode::OK, Json(response)).into_response()
}

impl ApiRequest for WhoamiRequest {
    type Response = WhoamiResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/session/whoami").unwrap();
        client.post(full_url).json(&self)
    }
}
