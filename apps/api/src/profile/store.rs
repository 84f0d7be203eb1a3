use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::career::{
    CareerProfileInput, CareerProfileRow, SettingsInput, UserSettingsRow,
};
use crate::models::profile::{ProfileInput, ProfileRow};

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn upsert_profile(
    pool: &PgPool,
    user_id: Uuid,
    input: &ProfileInput,
) -> Result<ProfileRow, AppError> {
    Ok(sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (id, full_name, avatar_url, email, phone, location, headline)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            avatar_url = EXCLUDED.avatar_url,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            location = EXCLUDED.location,
            headline = EXCLUDED.headline,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.full_name)
    .bind(&input.avatar_url)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.location)
    .bind(&input.headline)
    .fetch_one(pool)
    .await?)
}

/// The user's settings, or empty preferences when none were saved yet.
pub async fn get_settings(pool: &PgPool, user_id: Uuid) -> Result<UserSettingsRow, AppError> {
    let row = sqlx::query_as::<_, UserSettingsRow>("SELECT * FROM user_settings WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.unwrap_or_else(|| default_settings(user_id)))
}

pub async fn upsert_settings(
    pool: &PgPool,
    user_id: Uuid,
    input: &SettingsInput,
) -> Result<UserSettingsRow, AppError> {
    Ok(sqlx::query_as::<_, UserSettingsRow>(
        r#"
        INSERT INTO user_settings (user_id, preferences)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET
            preferences = EXCLUDED.preferences,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.preferences)
    .fetch_one(pool)
    .await?)
}

/// The user's career profile, or an empty one when none was saved yet.
pub async fn get_career_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<CareerProfileRow, AppError> {
    let row =
        sqlx::query_as::<_, CareerProfileRow>("SELECT * FROM career_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.unwrap_or_else(|| default_career_profile(user_id)))
}

pub async fn upsert_career_profile(
    pool: &PgPool,
    user_id: Uuid,
    input: &CareerProfileInput,
) -> Result<CareerProfileRow, AppError> {
    Ok(sqlx::query_as::<_, CareerProfileRow>(
        r#"
        INSERT INTO career_profiles (user_id, skills, interests, target_role, experience_level)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            skills = EXCLUDED.skills,
            interests = EXCLUDED.interests,
            target_role = EXCLUDED.target_role,
            experience_level = EXCLUDED.experience_level,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.skills)
    .bind(&input.interests)
    .bind(&input.target_role)
    .bind(&input.experience_level)
    .fetch_one(pool)
    .await?)
}

pub fn default_settings(user_id: Uuid) -> UserSettingsRow {
    UserSettingsRow {
        user_id,
        preferences: json!({}),
        updated_at: Utc::now(),
    }
}

pub fn default_career_profile(user_id: Uuid) -> CareerProfileRow {
    CareerProfileRow {
        user_id,
        skills: Vec::new(),
        interests: Vec::new(),
        target_role: None,
        experience_level: None,
        updated_at: Utc::now(),
    }
}

/// Trims entries and drops blanks and case-insensitive duplicates, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_empty() {
        let user_id = Uuid::new_v4();
        assert_eq!(default_settings(user_id).preferences, json!({}));
        let career = default_career_profile(user_id);
        assert!(career.skills.is_empty());
        assert!(career.target_role.is_none());
    }

    #[test]
    fn test_normalize_tags_dedups_case_insensitively() {
        let tags = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "SQL".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["Rust".to_string(), "SQL".to_string()]);
    }
}
