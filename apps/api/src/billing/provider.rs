//! Payment provider client (Stripe REST API).
//!
//! `AppState` holds an `Arc<dyn BillingProvider>` so handlers and the webhook
//! processor never depend on the concrete HTTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::subscription::Subscription;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payment provider error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub mode: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub client_reference_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

/// Parameters for a subscription-mode hosted checkout session.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutParams<'a> {
    pub customer_id: &'a str,
    pub price_id: &'a str,
    pub user_id: Uuid,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// The provider's subscription object, as delivered in webhooks and API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub ended_at: Option<i64>,
    pub trial_start: Option<i64>,
    pub trial_end: Option<i64>,
    pub created: Option<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub price: Option<Price>,
    pub quantity: Option<i32>,
    // Newer API versions report billing periods per item.
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

impl ProviderSubscription {
    /// The `user_id` stamped into subscription metadata at checkout, if any.
    pub fn metadata_user_id(&self) -> Option<Uuid> {
        self.metadata
            .get("user_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Maps the provider object onto the local mirror row.
    pub fn to_mirror(&self, user_id: Uuid, event_created: DateTime<Utc>) -> Subscription {
        let item = self.items.data.first();
        Subscription {
            id: self.id.clone(),
            user_id,
            customer_id: self.customer.clone(),
            status: self.status.clone(),
            price_id: item.and_then(|i| i.price.as_ref()).map(|p| p.id.clone()),
            quantity: item.and_then(|i| i.quantity),
            cancel_at_period_end: self.cancel_at_period_end,
            cancel_at: timestamp(self.cancel_at),
            canceled_at: timestamp(self.canceled_at),
            current_period_start: timestamp(
                self.current_period_start
                    .or_else(|| item.and_then(|i| i.current_period_start)),
            ),
            current_period_end: timestamp(
                self.current_period_end
                    .or_else(|| item.and_then(|i| i.current_period_end)),
            ),
            ended_at: timestamp(self.ended_at),
            trial_start: timestamp(self.trial_start),
            trial_end: timestamp(self.trial_end),
            metadata: Value::Object(self.metadata.clone()),
            created: timestamp(self.created),
            event_created,
        }
    }
}

/// Converts a unix-seconds timestamp from the provider.
pub fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_customer(
        &self,
        user_id: Uuid,
        email: Option<&str>,
    ) -> Result<String, BillingError>;

    async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CheckoutSession, BillingError>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<ProviderSubscription>, BillingError>;
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: String, base_url: String) -> Result<Self, BillingError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, BillingError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;
        read_response(response, path).await
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await?;
        read_response(response, path).await
    }
}

async fn read_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, BillingError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Payment provider returned {status} for {path}");
        return Err(BillingError::Api {
            status: status.as_u16(),
            message: crate::llm_client::api_error_message(body),
        });
    }
    debug!("Payment provider call succeeded: {path}");
    Ok(response.json().await?)
}

fn field(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(
        &self,
        user_id: Uuid,
        email: Option<&str>,
    ) -> Result<String, BillingError> {
        let mut form = vec![field("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(field("email", email));
        }
        let customer: Customer = self.post_form("/v1/customers", &form).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        let user_id = params.user_id.to_string();
        let form = vec![
            field("mode", "subscription"),
            field("customer", params.customer_id),
            field("line_items[0][price]", params.price_id),
            field("line_items[0][quantity]", "1"),
            field("client_reference_id", user_id.as_str()),
            field("subscription_data[metadata][user_id]", user_id.as_str()),
            field("allow_promotion_codes", "true"),
            field("success_url", params.success_url),
            field("cancel_url", params.cancel_url),
        ];
        self.post_form("/v1/checkout/sessions", &form).await
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let form = vec![
            field("customer", customer_id),
            field("return_url", return_url),
        ];
        self.post_form("/v1/billing_portal/sessions", &form).await
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        self.get(&format!("/v1/subscriptions/{subscription_id}"), &[])
            .await
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<ProviderSubscription>, BillingError> {
        let list: List<ProviderSubscription> = self
            .get(
                "/v1/subscriptions",
                &[("customer", customer_id), ("status", "all"), ("limit", "10")],
            )
            .await?;
        Ok(list.data)
    }
}
