use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub employment_type: Option<String>,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub apply_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub search_role: String,
    pub search_location: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// A listing mapped from the job-search API, ready to insert.
/// `(source, external_id)` identifies it across fetches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub source: &'static str,
    pub external_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub employment_type: Option<String>,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub apply_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}
