//! Axum route handlers for job listings.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{ActiveSubscriber, AuthUser};
use crate::errors::AppError;
use crate::jobs::jsearch::map_listing;
use crate::jobs::store::DEFAULT_LIST_LIMIT;
use crate::models::job::{JobRow, NewJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchJobsRequest {
    pub role: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchJobsResponse {
    pub fetched: usize,
    pub inserted: u64,
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub role: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
}

/// POST /api/v1/jobs/fetch
///
/// Premium only. One call to the job-search API, no pagination.
pub async fn handle_fetch_jobs(
    State(state): State<AppState>,
    ActiveSubscriber(user): ActiveSubscriber,
    Json(request): Json<FetchJobsRequest>,
) -> Result<Json<FetchJobsResponse>, AppError> {
    let role = request.role.trim();
    if role.is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    let location = request
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let listings = state
        .job_search
        .search(role, location)
        .await
        .map_err(|e| AppError::JobSearch(e.to_string()))?;
    let fetched = listings.len();
    let jobs: Vec<NewJob> = listings.into_iter().filter_map(map_listing).collect();

    let inserted = state.job_store.insert_jobs(&jobs, role, location).await?;
    info!(
        "Job fetch for user {}: role={role:?} location={location:?} fetched={fetched} usable={} inserted={inserted}",
        user.user_id,
        jobs.len()
    );

    Ok(Json(FetchJobsResponse { fetched, inserted }))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<JobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = state
        .job_store
        .list_jobs(
            query.role.as_deref().filter(|r| !r.trim().is_empty()),
            query.location.as_deref().filter(|l| !l.trim().is_empty()),
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await?;
    Ok(Json(jobs))
}
