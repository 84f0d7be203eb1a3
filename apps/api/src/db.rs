use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables the running service expects to exist after `migrate`.
pub const EXPECTED_TABLES: &[&str] = &[
    "profiles",
    "billing_customers",
    "subscriptions",
    "resumes",
    "user_settings",
    "career_profiles",
    "saved_insights",
    "jobs",
    "job_market_analytics",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies every pending file under `migrations/`, in version order.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Applying database migrations...");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Migration failed")?;
    info!("Database migrations applied");
    Ok(())
}

/// Returns the expected tables that are missing from the `public` schema.
pub async fn missing_tables(pool: &PgPool) -> Result<Vec<String>> {
    let present: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(pool)
    .await?;

    Ok(diff_tables(EXPECTED_TABLES, &present))
}

fn diff_tables(expected: &[&str], present: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|t| !present.iter().any(|p| p == *t))
        .map(|t| t.to_string())
        .collect()
}
