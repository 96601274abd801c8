use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::session::SessionState;

use crate::ServiceState;

/// Readiness tracks the session: the app is serving once an identity is
/// resolved, degraded while resolving, and degraded-with-reason when the
/// auth backend refused to issue one.
pub async fn handler(State(state): State<ServiceState>) -> Response {
    match state.session().state() {
        SessionState::Ready(session) => {
            let msg = serde_json::json!({"status": "ok", "user_id": session.user_id});
            (StatusCode::OK, Json(msg)).into_response()
        }
        SessionState::Resolving => {
            let msg = serde_json::json!({
                "status": "failure",
                "message": "session still resolving"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
        SessionState::Unavailable { reason } => {
            let msg = serde_json::json!({"status": "failure", "message": reason});
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
    }
}
