use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::insight::{MarketAnalyticsRow, NewInsight, SavedInsightRow};

pub async fn insert_insight(
    pool: &PgPool,
    user_id: Uuid,
    insight: &NewInsight,
) -> Result<SavedInsightRow, AppError> {
    Ok(sqlx::query_as::<_, SavedInsightRow>(
        r#"
        INSERT INTO saved_insights (id, user_id, insight_type, title, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&insight.insight_type)
    .bind(&insight.title)
    .bind(&insight.content)
    .fetch_one(pool)
    .await?)
}

pub async fn list_insights(pool: &PgPool, user_id: Uuid) -> Result<Vec<SavedInsightRow>, AppError> {
    Ok(sqlx::query_as::<_, SavedInsightRow>(
        "SELECT * FROM saved_insights WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Deletes one of the user's insights; returns whether a row was removed.
pub async fn delete_insight(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM saved_insights WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Cache of generated market snapshots keyed by `(role, location)`. Default: `PgMarketStore`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Inserts or replaces the snapshot for `(role, location)`.
    async fn upsert_market_analytics(
        &self,
        role: &str,
        location: &str,
        data: &Value,
    ) -> Result<MarketAnalyticsRow, AppError>;

    async fn get_market_analytics(
        &self,
        role: &str,
        location: &str,
    ) -> Result<Option<MarketAnalyticsRow>, AppError>;
}

pub struct PgMarketStore {
    pool: PgPool,
}

impl PgMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn upsert_market_analytics(
        &self,
        role: &str,
        location: &str,
        data: &Value,
    ) -> Result<MarketAnalyticsRow, AppError> {
        Ok(sqlx::query_as::<_, MarketAnalyticsRow>(
            r#"
            INSERT INTO job_market_analytics (id, role, location, data, generated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (role, location) DO UPDATE
                SET data = EXCLUDED.data,
                    generated_at = EXCLUDED.generated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(role)
        .bind(location)
        .bind(data)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_market_analytics(
        &self,
        role: &str,
        location: &str,
    ) -> Result<Option<MarketAnalyticsRow>, AppError> {
        Ok(sqlx::query_as::<_, MarketAnalyticsRow>(
            "SELECT * FROM job_market_analytics WHERE role = $1 AND location = $2",
        )
        .bind(role)
        .bind(location)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[sqlx::test]
    #[ignore] // Requires DATABASE_URL
    async fn test_market_upsert_replaces_snapshot(pool: PgPool) {
        let store = PgMarketStore::new(pool);

        let first = store
            .upsert_market_analytics("Data Engineer", "", &json!({ "demand_level": "low" }))
            .await
            .unwrap();
        let second = store
            .upsert_market_analytics("Data Engineer", "", &json!({ "demand_level": "high" }))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = store
            .get_market_analytics("Data Engineer", "")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data, json!({ "demand_level": "high" }));
        assert!(store
            .get_market_analytics("Data Engineer", "Berlin")
            .await
            .unwrap()
            .is_none());
    }
}
