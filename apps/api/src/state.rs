use std::sync::Arc;

use sqlx::PgPool;

use crate::billing::provider::BillingProvider;
use crate::billing::store::BillingStore;
use crate::config::Config;
use crate::insights::store::MarketStore;
use crate::jobs::jsearch::JobSearchClient;
use crate::jobs::store::JobStore;
use crate::llm_client::CompletionProvider;
use crate::storage::ObjectStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Subscription mirror and billing-customer mapping.
    pub billing_store: Arc<dyn BillingStore>,
    /// Payment provider API. Default: `StripeClient`.
    pub billing: Arc<dyn BillingProvider>,
    /// Chat-completion provider (OpenAI): mentor chat, skill analysis, resume work.
    pub chat_llm: Arc<dyn CompletionProvider>,
    /// Generative-content provider (Gemini): career and learning paths, market analytics.
    pub generative_llm: Arc<dyn CompletionProvider>,
    pub job_search: JobSearchClient,
    /// Fetched job listings. Default: `PgJobStore`.
    pub job_store: Arc<dyn JobStore>,
    /// Market analytics cache. Default: `PgMarketStore`.
    pub market_store: Arc<dyn MarketStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub config: Config,
}
