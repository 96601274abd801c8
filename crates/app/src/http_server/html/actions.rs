//! Form-post handlers behind the index page.
//!
//! Every action drives the shared UI state and redirects back to `/`;
//! outcomes (including failures) are surfaced there as the modal message,
//! so the page never renders an error page of its own.

use axum::extract::{Multipart, State};
use axum::response::Redirect;
use axum::Form;
use serde::Deserialize;

use common::document::{DocId, UserId};

use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct IdForm {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareForm {
    pub id: String,
    #[serde(default)]
    pub sharee: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeForm {
    pub id: String,
    pub user_id: String,
}

pub async fn upload(State(state): State<ServiceState>, mut multipart: Multipart) -> Redirect {
    let mut file: Option<(String, bytes::Bytes)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    match field.bytes().await {
                        Ok(data) => file = Some((file_name, data)),
                        Err(e) => {
                            state
                                .ui()
                                .write()
                                .surface(format!("Failed to read upload: {}", e));
                            return Redirect::to("/");
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                state
                    .ui()
                    .write()
                    .surface(format!("Failed to read upload: {}", e));
                return Redirect::to("/");
            }
        }
    }

    // An empty submission surfaces "Please select a file to upload."
    let (file_name, data) = file.unwrap_or_default();
    let _ = state.upload_document(&file_name, data).await;
    Redirect::to("/")
}

pub async fn delete(State(state): State<ServiceState>, Form(form): Form<IdForm>) -> Redirect {
    let _ = state.delete_document(&DocId::from(form.id.as_str())).await;
    Redirect::to("/")
}

pub async fn share_open(State(state): State<ServiceState>, Form(form): Form<IdForm>) -> Redirect {
    let _ = state.open_share(&DocId::from(form.id.as_str()));
    Redirect::to("/")
}

pub async fn share_submit(
    State(state): State<ServiceState>,
    Form(form): Form<ShareForm>,
) -> Redirect {
    state.ui().write().set_sharee_input(form.sharee.clone());
    let _ = state
        .share_document(
            &DocId::from(form.id.as_str()),
            &UserId::from(form.sharee.as_str()),
        )
        .await;
    Redirect::to("/")
}

pub async fn share_cancel(State(state): State<ServiceState>) -> Redirect {
    state.cancel_share();
    Redirect::to("/")
}

pub async fn revoke(State(state): State<ServiceState>, Form(form): Form<RevokeForm>) -> Redirect {
    let _ = state
        .revoke_access(
            &DocId::from(form.id.as_str()),
            &UserId::from(form.user_id.as_str()),
        )
        .await;
    Redirect::to("/")
}

pub async fn close_modal(State(state): State<ServiceState>) -> Redirect {
    state.close_modal();
    Redirect::to("/")
}
