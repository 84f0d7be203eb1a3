//! Axum route handlers for saved insights and market analytics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{ActiveSubscriber, AuthUser};
use crate::errors::AppError;
use crate::insights::prompts::{market_user_prompt, MARKET_ANALYTICS_SYSTEM};
use crate::insights::store::{delete_insight, insert_insight, list_insights};
use crate::insights::{market_data, market_key};
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{ChatTurn, CompletionRequest};
use crate::models::insight::{MarketAnalyticsRow, NewInsight, SavedInsightRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MarketRequest {
    pub role: String,
    pub location: Option<String>,
}

/// GET /api/v1/insights
pub async fn handle_list_insights(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SavedInsightRow>>, AppError> {
    Ok(Json(list_insights(&state.db, user.user_id).await?))
}

/// POST /api/v1/insights
pub async fn handle_create_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Json(insight): Json<NewInsight>,
) -> Result<(StatusCode, Json<SavedInsightRow>), AppError> {
    if insight.insight_type.trim().is_empty() || insight.title.trim().is_empty() {
        return Err(AppError::Validation(
            "insight_type and title are required".to_string(),
        ));
    }
    let row = insert_insight(&state.db, user.user_id, &insight).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/insights/:id
pub async fn handle_delete_insight(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if delete_insight(&state.db, user.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Insight {id} not found")))
    }
}

/// POST /api/v1/market/analytics
///
/// Premium only. Regenerates the snapshot and replaces the cached row.
pub async fn handle_generate_market_analytics(
    State(state): State<AppState>,
    ActiveSubscriber(user): ActiveSubscriber,
    Json(request): Json<MarketRequest>,
) -> Result<Json<MarketAnalyticsRow>, AppError> {
    let (role, location) = market_key(&request.role, request.location.as_deref());
    if role.is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }

    let system = system_prompt(MARKET_ANALYTICS_SYSTEM, true);
    let turns = [ChatTurn::user(market_user_prompt(&role, &location))];
    let completion = state
        .generative_llm
        .complete(CompletionRequest {
            system: &system,
            turns: &turns,
            json_output: true,
        })
        .await
        .map_err(|e| AppError::Llm(format!("market analytics call failed: {e}")))?;

    let data = market_data(&completion.text);
    let row = state
        .market_store
        .upsert_market_analytics(&role, &location, &data)
        .await?;
    info!(
        "Market analytics for {role:?} / {location:?} refreshed by user {}",
        user.user_id
    );
    Ok(Json(row))
}

/// GET /api/v1/market/analytics
pub async fn handle_get_market_analytics(
    State(state): State<AppState>,
    _subscriber: ActiveSubscriber,
    Query(request): Query<MarketRequest>,
) -> Result<Json<MarketAnalyticsRow>, AppError> {
    let (role, location) = market_key(&request.role, request.location.as_deref());
    state
        .market_store
        .get_market_analytics(&role, &location)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No market analytics for {role}")))
}
