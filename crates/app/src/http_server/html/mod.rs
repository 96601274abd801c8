use axum::routing::{get, post};
use axum::Router;

mod actions;
mod index;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(index::handler))
        .route("/upload", post(actions::upload))
        .route("/delete", post(actions::delete))
        .route("/share/open", post(actions::share_open))
        .route("/share", post(actions::share_submit))
        .route("/share/cancel", post(actions::share_cancel))
        .route("/revoke", post(actions::revoke))
        .route("/modal/close", post(actions::close_modal))
        .with_state(state)
}
