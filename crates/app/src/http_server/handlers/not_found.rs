use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
