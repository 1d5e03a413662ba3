use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ct_common::{Candidate, CandidateEntry, CandidateFilter, CandidateId, ListQuery};
use ct_metrics::CANDIDATES_CREATED_TOTAL;
use serde::{Deserialize, Serialize};

use super::pagination::{validate_pagination, validate_score_bound};
use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_with_score")]
    pub with_score: bool,
    pub name: Option<String>,
    pub college: Option<String>,
    pub degree: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

const fn default_with_score() -> bool {
    true
}

const fn default_page() -> i64 {
    1
}

const fn default_per_page() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: CandidateId,
    pub candidate: Candidate,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub candidate: CandidateEntry,
}

pub async fn create_candidate(
    State(state): State<SharedState>,
    Json(candidate): Json<Candidate>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let (id, candidate) = state
        .with_service(move |service| service.create(candidate))
        .await?;

    metrics::counter!(CANDIDATES_CREATED_TOTAL).increment(1);

    Ok(Json(CreatedResponse {
        message: "success",
        id,
        candidate,
    }))
}

pub async fn list_candidates(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<CandidateListResponse>, ApiError> {
    let (page, per_page) = validate_pagination(params.page, params.per_page)?;
    let min_score = validate_score_bound("min_score", params.min_score)?;
    let max_score = validate_score_bound("max_score", params.max_score)?;

    let query = ListQuery {
        filter: CandidateFilter {
            name: params.name,
            college: params.college,
            degree: params.degree,
            min_score,
            max_score,
        },
        with_score: params.with_score,
        page,
        per_page,
    };

    let page = state
        .with_service(move |service| service.list(&query))
        .await?;

    Ok(Json(CandidateListResponse {
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        total_pages: page.total_pages,
        candidates: page.items,
    }))
}

pub async fn get_candidate(
    State(state): State<SharedState>,
    Path(candidate_id): Path<usize>,
) -> Result<Json<CandidateResponse>, ApiError> {
    let id = CandidateId(candidate_id);
    let candidate = state
        .with_service(move |service| service.get(id))
        .await?
        .ok_or(ApiError::CandidateNotFound(id))?;

    Ok(Json(CandidateResponse { candidate }))
}

pub async fn clear_candidates(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
    state.with_service(|service| service.clear()).await?;
    Ok(StatusCode::NO_CONTENT)
}
