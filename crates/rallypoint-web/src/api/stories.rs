use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use rallypoint_core::{NewStory, Story};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_stories).post(submit_story))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub role: String,
    pub issue: String,
    pub title: String,
    pub story: String,
    pub consent: bool,
    pub is_approved: bool,
    pub created_at: String,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            name: s.name,
            location: s.location,
            role: s.role,
            issue: s.issue,
            title: s.title,
            story: s.body,
            consent: s.consent,
            is_approved: s.is_approved,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitStoryResponse {
    pub success: bool,
    pub story: StoryResponse,
    pub message: &'static str,
}

async fn list_stories(State(state): State<AppState>) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    let stories = state.engagement.stories().await?;

    Ok(Json(stories.into_iter().map(StoryResponse::from).collect()))
}

async fn submit_story(
    State(state): State<AppState>,
    payload: Result<Json<NewStory>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitStoryResponse>), ApiError> {
    let Json(story) = payload?;

    let story = state.engagement.submit_story(story).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitStoryResponse {
            success: true,
            story: StoryResponse::from(story),
            message: "Story submitted successfully!",
        }),
    ))
}
