use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use rallypoint_core::{Petition, PetitionStats, Signature, SignatureReceipt, SignatureRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_petitions))
        .route("/{petition}", get(recent_signatures))
        .route("/{petition}/sign", post(sign_petition))
        .route("/{petition}/stats", get(petition_stats))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

/// Public view of a signature. Never includes the email fingerprint.
#[derive(Debug, Serialize)]
pub struct SignatureResponse {
    pub id: Uuid,
    pub name: String,
    pub zip_code: String,
    pub display_public: bool,
    pub created_at: String,
}

impl From<SignatureReceipt> for SignatureResponse {
    fn from(r: SignatureReceipt) -> Self {
        Self {
            id: r.id,
            name: r.name,
            zip_code: r.zip_code,
            display_public: r.display_public,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

impl From<Signature> for SignatureResponse {
    fn from(s: Signature) -> Self {
        Self::from(SignatureReceipt::from(s))
    }
}

#[derive(Debug, Serialize)]
pub struct RecentSignaturesResponse {
    pub signatures: Vec<SignatureResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub goal_count: i64,
    pub is_main: bool,
}

impl From<Petition> for PetitionSummary {
    fn from(p: Petition) -> Self {
        Self {
            id: p.id.to_string(),
            slug: p.slug,
            title: p.title,
            goal_count: p.goal_count,
            is_main: p.is_main,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PetitionListResponse {
    pub petitions: Vec<PetitionSummary>,
}

async fn list_petitions(State(state): State<AppState>) -> Result<Json<PetitionListResponse>, ApiError> {
    let petitions = state.signatures.petitions().await?;

    Ok(Json(PetitionListResponse {
        petitions: petitions.into_iter().map(PetitionSummary::from).collect(),
    }))
}

async fn sign_petition(
    State(state): State<AppState>,
    Path(petition): Path<String>,
    payload: Result<Json<SignatureRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignatureResponse>), ApiError> {
    let Json(request) = payload?;

    let receipt = state.signatures.submit(&petition, &request).await?;

    Ok((StatusCode::CREATED, Json(SignatureResponse::from(receipt))))
}

async fn petition_stats(
    State(state): State<AppState>,
    Path(petition): Path<String>,
) -> Result<Json<PetitionStats>, ApiError> {
    Ok(Json(state.signatures.stats(&petition).await?))
}

async fn recent_signatures(
    State(state): State<AppState>,
    Path(petition): Path<String>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<RecentSignaturesResponse>, ApiError> {
    let Query(query) = query?;

    let signatures = state.signatures.recent(&petition, query.limit).await?;

    Ok(Json(RecentSignaturesResponse {
        signatures: signatures.into_iter().map(SignatureResponse::from).collect(),
    }))
}
