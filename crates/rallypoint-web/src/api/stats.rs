use axum::{Json, Router, extract::State, routing::get};
use rallypoint_core::PlatformStats;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/platform", get(platform_stats))
}

async fn platform_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>, ApiError> {
    Ok(Json(state.engagement.platform_stats().await?))
}
