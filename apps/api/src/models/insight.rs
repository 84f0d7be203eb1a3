use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedInsightRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub insight_type: String,
    pub title: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInsight {
    pub insight_type: String,
    pub title: String,
    pub content: Value,
}

/// Cached market snapshot for a `(role, location)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketAnalyticsRow {
    pub id: Uuid,
    pub role: String,
    /// Empty string when the snapshot is not location-specific.
    pub location: String,
    pub data: Value,
    pub generated_at: DateTime<Utc>,
}
