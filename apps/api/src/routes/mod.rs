pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::resume::handlers::MAX_IMPORT_BYTES;
use crate::state::AppState;
use crate::{ai, billing, insights, jobs, profile, resume};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Billing
        .route(
            "/api/v1/billing/checkout",
            post(billing::handlers::handle_checkout),
        )
        .route("/api/v1/billing/portal", post(billing::handlers::handle_portal))
        .route(
            "/api/v1/billing/subscription",
            get(billing::handlers::handle_get_subscription),
        )
        .route("/api/v1/billing/sync", post(billing::handlers::handle_sync))
        .route(
            "/api/v1/billing/webhook",
            post(billing::handlers::handle_webhook),
        )
        // AI proxy
        .route("/api/v1/ai/complete", post(ai::handlers::handle_complete))
        // Jobs and market
        .route("/api/v1/jobs", get(jobs::handlers::handle_list_jobs))
        .route("/api/v1/jobs/fetch", post(jobs::handlers::handle_fetch_jobs))
        .route(
            "/api/v1/market/analytics",
            get(insights::handlers::handle_get_market_analytics)
                .post(insights::handlers::handle_generate_market_analytics),
        )
        .route(
            "/api/v1/insights",
            get(insights::handlers::handle_list_insights)
                .post(insights::handlers::handle_create_insight),
        )
        .route(
            "/api/v1/insights/:id",
            delete(insights::handlers::handle_delete_insight),
        )
        // Records
        .route(
            "/api/v1/profile",
            get(profile::handlers::handle_get_profile).put(profile::handlers::handle_put_profile),
        )
        .route(
            "/api/v1/settings",
            get(profile::handlers::handle_get_settings)
                .put(profile::handlers::handle_put_settings),
        )
        .route(
            "/api/v1/career-profile",
            get(profile::handlers::handle_get_career_profile)
                .put(profile::handlers::handle_put_career_profile),
        )
        .route(
            "/api/v1/resume",
            get(resume::handlers::handle_get_resume).put(resume::handlers::handle_put_resume),
        )
        .route("/api/v1/resume/pdf", get(resume::handlers::handle_resume_pdf))
        .route(
            "/api/v1/resume/export",
            post(resume::handlers::handle_export_resume),
        )
        .route(
            "/api/v1/resume/import",
            post(resume::handlers::handle_import_resume)
                .layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .with_state(state)
}
