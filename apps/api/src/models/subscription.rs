use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Statuses that unlock premium features.
pub const ACTIVE_STATUSES: &[&str] = &["active", "trialing"];

/// Local mirror of the payment provider's subscription object,
/// keyed by the provider's subscription id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: String,
    pub user_id: Uuid,
    pub customer_id: String,
    pub status: String,
    pub price_id: Option<String>,
    pub quantity: Option<i32>,
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub metadata: Value,
    pub created: Option<DateTime<Utc>>,
    /// Creation time of the provider event that last wrote this row.
    pub event_created: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        ACTIVE_STATUSES.contains(&self.status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_status(status: &str) -> Subscription {
        Subscription {
            id: "sub_1".into(),
            user_id: Uuid::nil(),
            customer_id: "cus_1".into(),
            status: status.into(),
            price_id: None,
            quantity: None,
            cancel_at_period_end: false,
            cancel_at: None,
            canceled_at: None,
            current_period_start: None,
            current_period_end: None,
            ended_at: None,
            trial_start: None,
            trial_end: None,
            metadata: json!({}),
            created: None,
            event_created: Utc::now(),
        }
    }

    #[test]
    fn test_active_and_trialing_are_active() {
        assert!(with_status("active").is_active());
        assert!(with_status("trialing").is_active());
    }

    #[test]
    fn test_other_statuses_are_inactive() {
        for status in ["canceled", "past_due", "incomplete", "unpaid", "paused"] {
            assert!(!with_status(status).is_active(), "{status} should be inactive");
        }
    }
}
