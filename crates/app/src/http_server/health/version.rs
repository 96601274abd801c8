use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::version::build_info;

pub async fn handler() -> Response {
    let build = build_info();
    let msg = serde_json::json!({
        "version": build.version,
        "build_profile": build.build_profile,
        "build_timestamp": build.build_timestamp,
    });
    (StatusCode::OK, Json(msg)).into_response()
}
