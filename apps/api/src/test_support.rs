//! In-memory fakes and router helpers shared by handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{Claims, TOKEN_AUDIENCE};
use crate::billing::provider::{
    BillingError, BillingProvider, CheckoutParams, CheckoutSession, PortalSession,
    ProviderSubscription,
};
use crate::billing::store::{BillingStore, MirrorWrite};
use crate::config::Config;
use crate::errors::AppError;
use crate::insights::store::MarketStore;
use crate::jobs::jsearch::JobSearchClient;
use crate::jobs::store::{clamp_limit, JobStore};
use crate::llm_client::{Completion, CompletionProvider, CompletionRequest, LlmError};
use crate::models::insight::MarketAnalyticsRow;
use crate::models::job::{JobRow, NewJob};
use crate::models::subscription::Subscription;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ObjectStorage;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn issue_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("user@example.com".to_string()),
        aud: TOKEN_AUDIENCE.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Billing fakes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBillingStore {
    customers: Mutex<HashMap<Uuid, String>>,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    writes: AtomicUsize,
}

impl MemoryBillingStore {
    /// A store holding one active subscription for `user_id`.
    pub fn with_active(user_id: Uuid) -> Self {
        let store = Self::default();
        store.subscriptions.lock().unwrap().insert(
            "sub_active".to_string(),
            Subscription {
                id: "sub_active".to_string(),
                user_id,
                customer_id: "cus_active".to_string(),
                status: "active".to_string(),
                price_id: Some("price_pro".to_string()),
                quantity: Some(1),
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
            },
        );
        store
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    /// Number of successful writes of any kind.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingStore for MemoryBillingStore {
    async fn customer_for_user(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.customers.lock().unwrap().get(&user_id).cloned())
    }

    async fn user_for_customer(&self, customer_id: &str) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|(_, c)| c.as_str() == customer_id)
            .map(|(u, _)| *u))
    }

    async fn save_customer(&self, user_id: Uuid, customer_id: &str) -> Result<(), AppError> {
        self.customers
            .lock()
            .unwrap()
            .insert(user_id, customer_id.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
        mode: MirrorWrite,
    ) -> Result<bool, AppError> {
        let mut subs = self.subscriptions.lock().unwrap();
        let mut row = subscription.clone();
        if let Some(existing) = subs.get(&subscription.id) {
            if mode == MirrorWrite::Event && existing.event_created > subscription.event_created {
                return Ok(false);
            }
            row.event_created = existing.event_created.max(subscription.event_created);
        }
        subs.insert(row.id.clone(), row);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn subscription(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self.subscriptions.lock().unwrap().get(id).cloned())
    }

    async fn subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let subs = self.subscriptions.lock().unwrap();
        // Same order as the SQL: active first, then period end (nulls last), then event time.
        Ok(subs
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.is_active(), s.current_period_end, s.event_created))
            .cloned())
    }
}

#[derive(Default)]
pub struct FakeBilling {
    subscriptions: Mutex<Vec<Value>>,
    customers_created: AtomicUsize,
}

impl FakeBilling {
    /// Registers a provider subscription object returned by retrieve/list calls.
    pub fn add_subscription(&self, object: Value) {
        self.subscriptions.lock().unwrap().push(object);
    }

    pub fn customers_created(&self) -> usize {
        self.customers_created.load(Ordering::SeqCst)
    }

    fn parsed(&self) -> Vec<ProviderSubscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|v| serde_json::from_value(v.clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn create_customer(
        &self,
        _user_id: Uuid,
        _email: Option<&str>,
    ) -> Result<String, BillingError> {
        let n = self.customers_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cus_fake_{n}"))
    }

    async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        Ok(CheckoutSession {
            id: "cs_test_fake".to_string(),
            url: Some("https://checkout.stripe.com/c/pay/cs_test_fake".to_string()),
            mode: Some("subscription".to_string()),
            customer: Some(params.customer_id.to_string()),
            subscription: None,
            client_reference_id: Some(params.user_id.to_string()),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_id: &str,
        _return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        Ok(PortalSession {
            id: "bps_fake".to_string(),
            url: "https://billing.stripe.com/p/session/bps_fake".to_string(),
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        self.parsed()
            .into_iter()
            .find(|s| s.id == subscription_id)
            .ok_or(BillingError::Api {
                status: 404,
                message: format!("No such subscription: '{subscription_id}'"),
            })
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<ProviderSubscription>, BillingError> {
        Ok(self
            .parsed()
            .into_iter()
            .filter(|s| s.customer == customer_id)
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job and market fakes
// ────────────────────────────────────────────────────────────────────────────

/// Keyed on `(source, external_id)` like the `jobs` unique constraint.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<(String, String), JobRow>>,
}

impl MemoryJobStore {
    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert_jobs(
        &self,
        jobs: &[NewJob],
        search_role: &str,
        search_location: Option<&str>,
    ) -> Result<u64, AppError> {
        let mut stored = self.jobs.lock().unwrap();
        let mut inserted = 0;
        for job in jobs {
            let key = (job.source.to_string(), job.external_id.clone());
            if stored.contains_key(&key) {
                continue;
            }
            stored.insert(
                key,
                JobRow {
                    id: Uuid::new_v4(),
                    source: job.source.to_string(),
                    external_id: job.external_id.clone(),
                    title: job.title.clone(),
                    company: job.company.clone(),
                    location: job.location.clone(),
                    description: job.description.clone(),
                    employment_type: job.employment_type.clone(),
                    is_remote: job.is_remote,
                    salary_min: job.salary_min,
                    salary_max: job.salary_max,
                    apply_url: job.apply_url.clone(),
                    posted_at: job.posted_at,
                    search_role: search_role.to_string(),
                    search_location: search_location.map(str::to_string),
                    fetched_at: Utc::now(),
                },
            );
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_jobs(
        &self,
        role: Option<&str>,
        location: Option<&str>,
        limit: i64,
    ) -> Result<Vec<JobRow>, AppError> {
        let fits = |filter: Option<&str>, value: Option<&str>| match filter {
            None => true,
            Some(f) => value.is_some_and(|v| v.eq_ignore_ascii_case(f)),
        };
        let mut rows: Vec<JobRow> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| fits(role, Some(j.search_role.as_str())))
            .filter(|j| fits(location, j.search_location.as_deref()))
            .cloned()
            .collect();
        rows.sort_by_key(|j| std::cmp::Reverse((j.posted_at, j.fetched_at)));
        rows.truncate(clamp_limit(limit) as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryMarketStore {
    rows: Mutex<HashMap<(String, String), MarketAnalyticsRow>>,
}

#[async_trait]
impl MarketStore for MemoryMarketStore {
    async fn upsert_market_analytics(
        &self,
        role: &str,
        location: &str,
        data: &Value,
    ) -> Result<MarketAnalyticsRow, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((role.to_string(), location.to_string()))
            .and_modify(|row| {
                row.data = data.clone();
                row.generated_at = Utc::now();
            })
            .or_insert_with(|| MarketAnalyticsRow {
                id: Uuid::new_v4(),
                role: role.to_string(),
                location: location.to_string(),
                data: data.clone(),
                generated_at: Utc::now(),
            });
        Ok(row.clone())
    }

    async fn get_market_analytics(
        &self,
        role: &str,
        location: &str,
    ) -> Result<Option<MarketAnalyticsRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(role.to_string(), location.to_string()))
            .cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM and storage fakes
// ────────────────────────────────────────────────────────────────────────────

/// Replies with a canned text and records the system prompt and turn count of each call.
pub struct FakeLlm {
    reply: String,
    systems: Mutex<Vec<String>>,
    turn_counts: Mutex<Vec<usize>>,
}

impl FakeLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            systems: Mutex::new(Vec::new()),
            turn_counts: Mutex::new(Vec::new()),
        }
    }

    /// Number of turns sent on the most recent call.
    pub fn last_turn_count(&self) -> Option<usize> {
        self.turn_counts.lock().unwrap().last().copied()
    }

    pub fn call_count(&self) -> usize {
        self.systems.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for FakeLlm {
    fn model(&self) -> &'static str {
        "fake-model"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError> {
        self.systems
            .lock()
            .unwrap()
            .push(request.system.to_string());
        self.turn_counts.lock().unwrap().push(request.turns.len());
        Ok(Completion {
            text: self.reply.clone(),
            model: "fake-model",
            input_tokens: 1,
            output_tokens: 1,
        })
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryStorage {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|(b, _)| b.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://storage.example.com/documents/{key}")
    }

    async fn bucket_exists(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State and router helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/careervision_test".to_string(),
        s3_bucket: "documents".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_public_url: "https://storage.example.com/documents".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        auth_jwt_secret: TEST_JWT_SECRET.to_string(),
        stripe_secret_key: "sk_test".to_string(),
        stripe_webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        stripe_api_base: "http://localhost:12111".to_string(),
        stripe_price_ids: Vec::new(),
        openai_api_key: "sk-test".to_string(),
        openai_api_base: "http://localhost:12112".to_string(),
        gemini_api_key: "g-test".to_string(),
        gemini_api_base: "http://localhost:12113".to_string(),
        jsearch_api_key: "rapid-test".to_string(),
        jsearch_api_base: "http://localhost:12114".to_string(),
        app_url: "https://app.example.com".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state(
    billing_store: Arc<dyn BillingStore>,
    billing: Arc<dyn BillingProvider>,
) -> AppState {
    test_state_with_llm(
        billing_store,
        billing,
        Arc::new(FakeLlm::replying("{}")),
        Arc::new(FakeLlm::replying("{}")),
    )
}

pub fn test_state_with_llm(
    billing_store: Arc<dyn BillingStore>,
    billing: Arc<dyn BillingProvider>,
    chat_llm: Arc<dyn CompletionProvider>,
    generative_llm: Arc<dyn CompletionProvider>,
) -> AppState {
    let config = test_config();
    AppState {
        // Never connects; handlers under test do not touch Postgres.
        db: PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap(),
        billing_store,
        billing,
        chat_llm,
        generative_llm,
        job_search: JobSearchClient::new(
            config.jsearch_api_key.clone(),
            config.jsearch_api_base.clone(),
        )
        .unwrap(),
        job_store: Arc::new(MemoryJobStore::default()),
        market_store: Arc::new(MemoryMarketStore::default()),
        storage: Arc::new(MemoryStorage::default()),
        config,
    }
}

pub async fn post_json(state: AppState, uri: &str, token: Option<&str>, body: Value) -> Response {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    build_router(state)
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn post_raw(
    state: AppState,
    uri: &str,
    signature: Option<&str>,
    body: String,
) -> Response {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        request = request.header("stripe-signature", signature);
    }
    build_router(state)
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn get(state: AppState, uri: &str, token: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    build_router(state)
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
