use axum::routing::post;
use axum::Router;

pub mod whoami;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/whoami", post(whoami::handler))
        .with_state(state)
}
