//! Billing webhook: signature verification and mirror upserts.
//!
//! Signature header: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed payload is
//! `"{t}.{raw body}"`, HMAC-SHA256 keyed with the endpoint secret.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::provider::{BillingProvider, CheckoutSession, ProviderSubscription};
use crate::billing::store::{BillingStore, MirrorWrite};
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
/// Maximum age of a signed timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("signature header has no timestamp")]
    MissingTimestamp,

    #[error("signature header has no v1 signatures")]
    MissingSignature,

    #[error("timestamp outside tolerance")]
    StaleTimestamp,

    #[error("no signature matches the payload")]
    Mismatch,
}

/// Verifies a signature header against the raw request body.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds a valid signature header for `payload`. Mirrors what the provider sends.
#[cfg(test)]
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Deserialize)]
struct Invoice {
    subscription: Option<String>,
    parent: Option<InvoiceParent>,
}

#[derive(Debug, Deserialize)]
struct InvoiceParent {
    subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDetails {
    subscription: Option<String>,
}

impl Invoice {
    fn subscription_id(self) -> Option<String> {
        self.subscription.or_else(|| {
            self.parent
                .and_then(|p| p.subscription_details)
                .and_then(|d| d.subscription)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The mirror row for this subscription id was written.
    Upserted(String),
    /// A newer event already wrote the row.
    Stale(String),
    /// The owning user could not be determined.
    Unresolved(String),
    Ignored,
}

/// Applies one verified event to the subscription mirror.
pub async fn process_event(
    event: WebhookEvent,
    store: &dyn BillingStore,
    provider: &dyn BillingProvider,
) -> Result<EventOutcome, AppError> {
    let event_created = DateTime::from_timestamp(event.created, 0)
        .ok_or_else(|| AppError::Validation("event timestamp out of range".to_string()))?;

    match event.event_type.as_str() {
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => {
            let subscription: ProviderSubscription = parse_object(event.data.object)?;
            let deleted = event.event_type == "customer.subscription.deleted";
            mirror(store, subscription, None, event_created, deleted, MirrorWrite::Event).await
        }
        "checkout.session.completed" => {
            let session: CheckoutSession = parse_object(event.data.object)?;
            let Some(subscription_id) = session.subscription.as_deref() else {
                info!("Checkout session {} has no subscription; ignoring", session.id);
                return Ok(EventOutcome::Ignored);
            };
            let user_hint = session
                .client_reference_id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id).ok());
            if let (Some(user_id), Some(customer)) = (user_hint, session.customer.as_deref()) {
                store.save_customer(user_id, customer).await?;
            }
            let subscription = retrieve(provider, subscription_id).await?;
            mirror(
                store,
                subscription,
                user_hint,
                event_created,
                false,
                MirrorWrite::Snapshot,
            )
            .await
        }
        "invoice.payment_succeeded" => {
            let invoice: Invoice = parse_object(event.data.object)?;
            let Some(subscription_id) = invoice.subscription_id() else {
                return Ok(EventOutcome::Ignored);
            };
            let subscription = retrieve(provider, &subscription_id).await?;
            mirror(store, subscription, None, event_created, false, MirrorWrite::Snapshot).await
        }
        other => {
            info!("Ignoring webhook event {} of type {other}", event.id);
            Ok(EventOutcome::Ignored)
        }
    }
}

fn parse_object<T: for<'de> Deserialize<'de>>(object: Value) -> Result<T, AppError> {
    serde_json::from_value(object)
        .map_err(|e| AppError::Validation(format!("Malformed event object: {e}")))
}

async fn retrieve(
    provider: &dyn BillingProvider,
    subscription_id: &str,
) -> Result<ProviderSubscription, AppError> {
    provider
        .retrieve_subscription(subscription_id)
        .await
        .map_err(|e| AppError::Billing(format!("Retrieving {subscription_id} failed: {e}")))
}

async fn mirror(
    store: &dyn BillingStore,
    subscription: ProviderSubscription,
    user_hint: Option<Uuid>,
    event_created: DateTime<Utc>,
    deleted: bool,
    mode: MirrorWrite,
) -> Result<EventOutcome, AppError> {
    let user_id = match subscription.metadata_user_id().or(user_hint) {
        Some(id) => Some(id),
        None => store.user_for_customer(&subscription.customer).await?,
    };
    let Some(user_id) = user_id else {
        warn!(
            "No user for subscription {} (customer {}); not mirrored",
            subscription.id, subscription.customer
        );
        return Ok(EventOutcome::Unresolved(subscription.id));
    };

    let mut row = subscription.to_mirror(user_id, event_created);
    if deleted {
        row.status = "canceled".to_string();
        row.canceled_at = row.canceled_at.or(Some(event_created));
    }

    if store.upsert_subscription(&row, mode).await? {
        info!(
            "Mirrored subscription {} for user {user_id}: status={}",
            row.id, row.status
        );
        Ok(EventOutcome::Upserted(row.id))
    } else {
        info!("Skipped stale event for subscription {}", row.id);
        Ok(EventOutcome::Stale(row.id))
    }
}
