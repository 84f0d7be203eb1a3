use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeContent, ResumeRow};

pub async fn get_resume(pool: &PgPool, user_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Replaces the user's resume wholesale, creating it on first save.
pub async fn upsert_resume(
    pool: &PgPool,
    user_id: Uuid,
    content: &ResumeContent,
) -> Result<ResumeRow, AppError> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, full_name, email, phone, location, summary, skills, experience, education)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            location = EXCLUDED.location,
            summary = EXCLUDED.summary,
            skills = EXCLUDED.skills,
            experience = EXCLUDED.experience,
            education = EXCLUDED.education,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&content.full_name)
    .bind(&content.email)
    .bind(&content.phone)
    .bind(&content.location)
    .bind(&content.summary)
    .bind(&content.skills)
    .bind(Json(&content.experience))
    .bind(Json(&content.education))
    .fetch_one(pool)
    .await?)
}
