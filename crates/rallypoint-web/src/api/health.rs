use axum::{Json, Router, extract::State, routing::get};
use rallypoint_core::DurableStatus;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub durable: DurableStatus,
}

/// Always answers `ok`: the service keeps serving from the fallback store
/// while the durable store is down.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        durable: state.store.durable_status().await,
    })
}
