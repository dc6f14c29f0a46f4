use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use market::{City, CityPriceBundle, PriceSnapshot};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::source::DataSource;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub data_source: DataSource,
    pub live_enabled: bool,
    pub last_update: u64,
    pub city_count: usize,
}

/// GET /cities
pub async fn list_cities(State(state): State<Arc<AppState>>) -> Json<Vec<City>> {
    Json(state.cities.cities())
}

/// GET /prices: the full current snapshot.
pub async fn all_prices(State(state): State<Arc<AppState>>) -> Json<PriceSnapshot> {
    Json(state.store.snapshot().as_ref().clone())
}

/// GET /prices/{city_id}
pub async fn city_prices(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<String>,
) -> Result<Json<CityPriceBundle>, ApiError> {
    state
        .store
        .get(&city_id)
        .map(Json)
        .ok_or(ApiError::UnknownCity(city_id))
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusView> {
    let source = state.scheduler.status();
    let snapshot = state.store.snapshot();

    Json(StatusView {
        data_source: source.data_source,
        live_enabled: source.live_enabled,
        last_update: snapshot.updated_ms,
        city_count: snapshot.len(),
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
