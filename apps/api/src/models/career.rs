use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Free-form UI preferences, read and written wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettingsRow {
    pub user_id: Uuid,
    pub preferences: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsInput {
    pub preferences: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CareerProfileRow {
    pub user_id: Uuid,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub target_role: Option<String>,
    pub experience_level: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CareerProfileInput {
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub target_role: Option<String>,
    pub experience_level: Option<String>,
}
