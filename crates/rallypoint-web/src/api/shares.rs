use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use rallypoint_core::{NewSocialShare, SocialShare};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_share))
        .route("/count", get(share_count))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    entity_type: String,
    entity_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

async fn record_share(
    State(state): State<AppState>,
    payload: Result<Json<NewSocialShare>, JsonRejection>,
) -> Result<(StatusCode, Json<SocialShare>), ApiError> {
    let Json(share) = payload?;

    let share = state.engagement.record_share(share).await?;

    Ok((StatusCode::CREATED, Json(share)))
}

async fn share_count(
    State(state): State<AppState>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let Query(query) = query?;

    let count = state
        .engagement
        .share_count(&query.entity_type, query.entity_id.as_deref())
        .await?;

    Ok(Json(CountResponse { count }))
}
