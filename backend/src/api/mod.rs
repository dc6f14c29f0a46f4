pub mod routes;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Assemble the pull API and the push endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cities", get(routes::list_cities))
        .route("/prices", get(routes::all_prices))
        .route("/prices/{city_id}", get(routes::city_prices))
        .route("/status", get(routes::status))
        .route("/health", get(routes::health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}
