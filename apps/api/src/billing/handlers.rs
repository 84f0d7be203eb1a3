//! Axum route handlers for the Billing API.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthUser;
use crate::billing::provider::{timestamp, CheckoutParams};
use crate::billing::store::MirrorWrite;
use crate::billing::webhook::{process_event, verify_signature, WebhookEvent, SIGNATURE_HEADER};
use crate::errors::AppError;
use crate::models::subscription::Subscription;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub price_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub subscription: Option<Subscription>,
    pub is_active: bool,
}

impl From<Option<Subscription>> for SubscriptionStatusResponse {
    fn from(subscription: Option<Subscription>) -> Self {
        let is_active = subscription.as_ref().is_some_and(Subscription::is_active);
        Self {
            subscription,
            is_active,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/billing/checkout
///
/// Finds or creates the caller's billing customer and opens a hosted checkout
/// session for the requested price.
pub async fn handle_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let price_id = request.price_id.trim();
    if price_id.is_empty() {
        return Err(AppError::Validation("price_id cannot be empty".to_string()));
    }
    if !price_allowed(price_id, &state.config.stripe_price_ids) {
        return Err(AppError::Validation(format!("Unknown price '{price_id}'")));
    }

    let customer_id = match state.billing_store.customer_for_user(user.user_id).await? {
        Some(id) => id,
        None => {
            let id = state
                .billing
                .create_customer(user.user_id, user.email.as_deref())
                .await
                .map_err(|e| AppError::Billing(format!("Customer creation failed: {e}")))?;
            state.billing_store.save_customer(user.user_id, &id).await?;
            info!("Created billing customer {id} for user {}", user.user_id);
            id
        }
    };

    let app_url = state.config.app_url.trim_end_matches('/');
    let success_url = format!("{app_url}/dashboard?checkout=success&session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{app_url}/pricing?checkout=canceled");

    let session = state
        .billing
        .create_checkout_session(CheckoutParams {
            customer_id: &customer_id,
            price_id,
            user_id: user.user_id,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await
        .map_err(|e| AppError::Billing(format!("Checkout session failed: {e}")))?;

    let url = session
        .url
        .filter(|u| is_https_url(u))
        .ok_or_else(|| AppError::Billing(format!("Session {} has no usable URL", session.id)))?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url,
    }))
}

/// POST /api/v1/billing/portal
pub async fn handle_portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PortalResponse>, AppError> {
    let customer_id = state
        .billing_store
        .customer_for_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No billing account for this user".to_string()))?;

    let return_url = format!("{}/dashboard", state.config.app_url.trim_end_matches('/'));
    let session = state
        .billing
        .create_portal_session(&customer_id, &return_url)
        .await
        .map_err(|e| AppError::Billing(format!("Portal session failed: {e}")))?;

    Ok(Json(PortalResponse { url: session.url }))
}

/// GET /api/v1/billing/subscription
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionStatusResponse>, AppError> {
    let subscription = state.billing_store.subscription_for_user(user.user_id).await?;
    Ok(Json(subscription.into()))
}

/// POST /api/v1/billing/sync
///
/// Pulls the caller's subscriptions from the payment provider and refreshes the mirror.
pub async fn handle_sync(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionStatusResponse>, AppError> {
    if let Some(customer_id) = state.billing_store.customer_for_user(user.user_id).await? {
        let subscriptions = state
            .billing
            .list_subscriptions(&customer_id)
            .await
            .map_err(|e| AppError::Billing(format!("Listing subscriptions failed: {e}")))?;

        for subscription in &subscriptions {
            // Stamped with the provider's own creation time so later webhooks still apply.
            let stamp = timestamp(subscription.created).unwrap_or_default();
            state
                .billing_store
                .upsert_subscription(
                    &subscription.to_mirror(user.user_id, stamp),
                    MirrorWrite::Snapshot,
                )
                .await?;
        }
        info!(
            "Synced {} subscription(s) for user {}",
            subscriptions.len(),
            user.user_id
        );
    }

    let subscription = state.billing_store.subscription_for_user(user.user_id).await?;
    Ok(Json(subscription.into()))
}

/// POST /api/v1/billing/webhook
///
/// Unauthenticated; trust comes from the signature alone. Nothing is written
/// unless the signature verifies.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::InvalidSignature("missing signature header".to_string()))?;

    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| AppError::InvalidSignature(e.to_string()))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed event: {e}")))?;
    info!("Webhook event {} ({})", event.id, event.event_type);

    process_event(event, state.billing_store.as_ref(), state.billing.as_ref()).await?;

    Ok(Json(json!({ "received": true })))
}

fn price_allowed(price_id: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        price_id.starts_with("price_")
    } else {
        allowed.iter().any(|p| p == price_id)
    }
}

fn is_https_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| u.scheme() == "https" && u.host_str().is_some())
        .unwrap_or(false)
}
