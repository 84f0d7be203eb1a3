use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, NewJob};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

/// Persistence for fetched job listings. Default: `PgJobStore`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts listings, ignoring ones already stored under the same
    /// `(source, external_id)`. Returns how many rows were new.
    async fn insert_jobs(
        &self,
        jobs: &[NewJob],
        search_role: &str,
        search_location: Option<&str>,
    ) -> Result<u64, AppError>;

    /// Stored jobs, newest first. Filters match the role and location a fetch was made for.
    async fn list_jobs(
        &self,
        role: Option<&str>,
        location: Option<&str>,
        limit: i64,
    ) -> Result<Vec<JobRow>, AppError>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert_jobs(
        &self,
        jobs: &[NewJob],
        search_role: &str,
        search_location: Option<&str>,
    ) -> Result<u64, AppError> {
        let mut inserted = 0;
        for job in jobs {
            let result = sqlx::query(
                r#"
                INSERT INTO jobs
                    (id, source, external_id, title, company, location, description,
                     employment_type, is_remote, salary_min, salary_max, apply_url, posted_at,
                     search_role, search_location)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                ON CONFLICT (source, external_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(job.source)
            .bind(&job.external_id)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.description)
            .bind(&job.employment_type)
            .bind(job.is_remote)
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.apply_url)
            .bind(job.posted_at)
            .bind(search_role)
            .bind(search_location)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn list_jobs(
        &self,
        role: Option<&str>,
        location: Option<&str>,
        limit: i64,
    ) -> Result<Vec<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE ($1::TEXT IS NULL OR search_role ILIKE $1)
              AND ($2::TEXT IS NULL OR search_location ILIKE $2)
            ORDER BY posted_at DESC NULLS LAST, fetched_at DESC
            LIMIT $3
            "#,
        )
        .bind(role)
        .bind(location)
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?)
    }
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIST_LIMIT)
}
