use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::Subscription;

/// How a mirror write is ordered against the row already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorWrite {
    /// Object carried inside a provider event. Skipped when a newer event already wrote the row.
    Event,
    /// Object fetched live from the provider API. Always applied; the stored
    /// `event_created` only moves forward.
    Snapshot,
}

/// Persistence for the subscription mirror and the user → billing customer mapping.
///
/// Carried in `AppState` as `Arc<dyn BillingStore>`. Default: `PgBillingStore`.
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<String>, AppError>;

    async fn user_for_customer(&self, customer_id: &str) -> Result<Option<Uuid>, AppError>;

    async fn save_customer(&self, user_id: Uuid, customer_id: &str) -> Result<(), AppError>;

    /// Inserts or replaces the row keyed by `subscription.id`; returns whether the row was written.
    ///
    /// With `MirrorWrite::Event`, a row already written by a newer provider event is left untouched.
    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
        mode: MirrorWrite,
    ) -> Result<bool, AppError>;

    async fn subscription(&self, id: &str) -> Result<Option<Subscription>, AppError>;

    /// The user's most relevant subscription: active ones first, then the latest period.
    async fn subscription_for_user(&self, user_id: Uuid)
        -> Result<Option<Subscription>, AppError>;
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, customer_id, status, price_id, quantity, \
    cancel_at_period_end, cancel_at, canceled_at, current_period_start, current_period_end, \
    ended_at, trial_start, trial_end, metadata, created, event_created";

pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT customer_id FROM billing_customers WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn user_for_customer(&self, customer_id: &str) -> Result<Option<Uuid>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT user_id FROM billing_customers WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_customer(&self, user_id: Uuid, customer_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO billing_customers (user_id, customer_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET customer_id = EXCLUDED.customer_id
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_subscription(
        &self,
        s: &Subscription,
        mode: MirrorWrite,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, user_id, customer_id, status, price_id, quantity,
                 cancel_at_period_end, cancel_at, canceled_at, current_period_start,
                 current_period_end, ended_at, trial_start, trial_end, metadata,
                 created, event_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                customer_id = EXCLUDED.customer_id,
                status = EXCLUDED.status,
                price_id = EXCLUDED.price_id,
                quantity = EXCLUDED.quantity,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                cancel_at = EXCLUDED.cancel_at,
                canceled_at = EXCLUDED.canceled_at,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                ended_at = EXCLUDED.ended_at,
                trial_start = EXCLUDED.trial_start,
                trial_end = EXCLUDED.trial_end,
                metadata = EXCLUDED.metadata,
                created = EXCLUDED.created,
                event_created = GREATEST(subscriptions.event_created, EXCLUDED.event_created),
                updated_at = NOW()
            WHERE $18 OR subscriptions.event_created <= EXCLUDED.event_created
            "#,
        )
        .bind(&s.id)
        .bind(s.user_id)
        .bind(&s.customer_id)
        .bind(&s.status)
        .bind(&s.price_id)
        .bind(s.quantity)
        .bind(s.cancel_at_period_end)
        .bind(s.cancel_at)
        .bind(s.canceled_at)
        .bind(s.current_period_start)
        .bind(s.current_period_end)
        .bind(s.ended_at)
        .bind(s.trial_start)
        .bind(s.trial_end)
        .bind(&s.metadata)
        .bind(s.created)
        .bind(s.event_created)
        .bind(mode == MirrorWrite::Snapshot)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn subscription(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY (status IN ('active', 'trialing')) DESC,
                     current_period_end DESC NULLS LAST,
                     event_created DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
