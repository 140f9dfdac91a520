use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use aid_store::LedgerStore;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all engagement endpoints.
pub fn build_router<S: LedgerStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route(
            "/causes/:id/like",
            post(handler::toggle_like::<S>).get(handler::like_status::<S>),
        )
        .route(
            "/offerings/:id/enrollments",
            post(handler::request_enrollment::<S>).get(handler::list_enrollments::<S>),
        )
        .route(
            "/enrollments/:id",
            put(handler::review_enrollment::<S>).delete(handler::withdraw_enrollment::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
