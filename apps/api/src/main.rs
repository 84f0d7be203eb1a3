mod ai;
mod auth;
mod billing;
mod config;
mod db;
mod errors;
mod insights;
mod jobs;
mod llm_client;
mod models;
mod profile;
mod resume;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::provider::StripeClient;
use crate::billing::store::PgBillingStore;
use crate::config::Config;
use crate::db::{create_pool, missing_tables, run_migrations};
use crate::insights::store::PgMarketStore;
use crate::jobs::jsearch::JobSearchClient;
use crate::jobs::store::PgJobStore;
use crate::llm_client::{CompletionProvider, GeminiClient, OpenAiClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{ObjectStorage, S3Storage};

#[derive(Debug, Parser)]
#[command(name = "careervision", version, about = "CareerVision API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Check that every expected table and the storage bucket exist.
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Migrate => {
            init_tracing("info");
            let pool = create_pool(&Config::database_url_from_env()?).await?;
            run_migrations(&pool).await
        }
        Command::Verify => verify().await,
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    info!("Starting CareerVision API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let storage = S3Storage::from_config(&config).await;
    info!("S3 client initialized (bucket: {})", storage.bucket());

    let chat_llm: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_api_base.clone(),
    )?);
    let generative_llm: Arc<dyn CompletionProvider> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
    )?);
    info!(
        "LLM clients initialized (chat: {}, generative: {})",
        chat_llm.model(),
        generative_llm.model()
    );

    let billing = Arc::new(StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    )?);
    if config.stripe_price_ids.is_empty() {
        warn!("STRIPE_PRICE_IDS is empty; checkout accepts any price_ id");
    }

    let job_search = JobSearchClient::new(
        config.jsearch_api_key.clone(),
        config.jsearch_api_base.clone(),
    )?;

    let state = AppState {
        billing_store: Arc::new(PgBillingStore::new(db.clone())),
        job_store: Arc::new(PgJobStore::new(db.clone())),
        market_store: Arc::new(PgMarketStore::new(db.clone())),
        db,
        billing,
        chat_llm,
        generative_llm,
        job_search,
        storage: Arc::new(storage),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn verify() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    let pool = create_pool(&config.database_url).await?;
    let missing = missing_tables(&pool).await?;
    for table in &missing {
        warn!("Missing table: {table}");
    }

    let storage = S3Storage::from_config(&config).await;
    let bucket_ok = storage.bucket_exists().await?;
    if !bucket_ok {
        warn!("Missing storage bucket: {}", storage.bucket());
    }

    if !missing.is_empty() || !bucket_ok {
        bail!(
            "verification failed: {} missing table(s), bucket {}",
            missing.len(),
            if bucket_ok { "ok" } else { "missing" }
        );
    }
    info!("Schema and storage verified");
    Ok(())
}
