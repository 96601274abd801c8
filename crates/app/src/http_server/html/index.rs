use askama::Template;
use askama_axum::IntoResponse;
use axum::extract::State;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

use common::session::SessionState;

use crate::ServiceState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user_id: Option<String>,
    pub unavailable_reason: Option<String>,
    pub uploading: bool,
    pub docs: Vec<DocDisplayInfo>,
    pub message: Option<String>,
    pub last_uploaded: Option<String>,
    pub sharing: Option<ShareDisplayInfo>,
    pub sharee_input: String,
}

#[derive(Debug, Clone)]
pub struct DocDisplayInfo {
    pub id: String,
    pub file_name: String,
    pub url: String,
    pub owner: String,
    pub owned: bool,
    pub uploaded_at: String,
}

#[derive(Debug, Clone)]
pub struct ShareDisplayInfo {
    pub id: String,
    pub file_name: String,
    pub shared_with: Vec<String>,
}

#[instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> askama_axum::Response {
    let (user_id, unavailable_reason) = match state.session().state() {
        SessionState::Ready(session) => (Some(session.user_id.to_string()), None),
        SessionState::Resolving => (None, None),
        SessionState::Unavailable { reason } => (None, Some(reason)),
    };

    let identity = state.identity();
    let docs = state
        .documents()
        .into_iter()
        .map(|record| DocDisplayInfo {
            id: record.id.to_string(),
            file_name: record.file_name.clone(),
            url: record.url.clone(),
            owner: record.owner.to_string(),
            owned: identity
                .as_ref()
                .map(|me| record.is_owned_by(me))
                .unwrap_or(false),
            uploaded_at: record
                .uploaded_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| record.uploaded_at.to_string()),
        })
        .collect();

    let ui = state.ui().read().clone();
    let sharing = ui.sharing().map(|record| ShareDisplayInfo {
        id: record.id.to_string(),
        file_name: record.file_name.clone(),
        shared_with: record.shared_with.iter().map(|u| u.to_string()).collect(),
    });

    let template = IndexTemplate {
        user_id,
        unavailable_reason,
        uploading: ui.is_uploading(),
        docs,
        message: ui.message().map(str::to_string),
        last_uploaded: ui.last_uploaded().map(str::to_string),
        sharing,
        sharee_input: ui.sharee_input().to_string(),
    };

    template.into_response()
}
