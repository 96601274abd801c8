use axum::Router;

pub mod docs;
pub mod session;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/docs", docs::router(state.clone()))
        .nest("/session", session::router(state.clone()))
        .with_state(state)
}
