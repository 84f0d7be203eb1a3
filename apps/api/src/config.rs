use anyhow::{bail, Context, Result};

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_JSEARCH_API_BASE: &str = "https://jsearch.p.rapidapi.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or blank.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base URL under which stored objects are publicly readable.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// HS256 secret the hosted auth provider signs access tokens with.
    pub auth_jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    /// Price ids accepted by checkout. Empty means any `price_` id is accepted.
    pub stripe_price_ids: Vec<String>,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub jsearch_api_key: String,
    pub jsearch_api_base: String,
    /// Public URL of the frontend, used for checkout and portal redirects.
    pub app_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let s3_bucket = require_env("S3_BUCKET")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_public_url: std::env::var("S3_PUBLIC_URL")
                .unwrap_or_else(|_| format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)),
            s3_bucket,
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            auth_jwt_secret: require_env("AUTH_JWT_SECRET")?,
            stripe_secret_key: require_env("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: require_env("STRIPE_WEBHOOK_SECRET")?,
            stripe_api_base: env_or("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
            stripe_price_ids: parse_list(&std::env::var("STRIPE_PRICE_IDS").unwrap_or_default()),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_base: env_or("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: env_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            jsearch_api_key: require_env("JSEARCH_API_KEY")?,
            jsearch_api_base: env_or("JSEARCH_API_BASE", DEFAULT_JSEARCH_API_BASE),
            app_url: env_or("APP_URL", "http://localhost:5173"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Only the database settings, for the `migrate` subcommand.
    pub fn database_url_from_env() -> Result<String> {
        dotenvy::dotenv().ok();
        require_env("DATABASE_URL")
    }
}

fn require_env(key: &str) -> Result<String> {
    non_blank(key, std::env::var(key).ok())
}

/// Required values must be present and not blank.
fn non_blank(key: &str, value: Option<String>) -> Result<String> {
    let value =
        value.with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Splits a comma-separated env value, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_skips_blanks() {
        assert_eq!(
            parse_list(" price_a, ,price_b ,"),
            vec!["price_a".to_string(), "price_b".to_string()]
        );
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_required_value_rejects_missing_and_blank() {
        let missing = non_blank("AUTH_JWT_SECRET", None).unwrap_err();
        assert!(missing.to_string().contains("is not set"));

        for blank in ["", "   ", "\t\n"] {
            let err = non_blank("STRIPE_WEBHOOK_SECRET", Some(blank.to_string())).unwrap_err();
            assert!(err.to_string().contains("'STRIPE_WEBHOOK_SECRET' is empty"), "{err}");
        }

        assert_eq!(
            non_blank("AUTH_JWT_SECRET", Some("s3cret".to_string())).unwrap(),
            "s3cret"
        );
    }
}
