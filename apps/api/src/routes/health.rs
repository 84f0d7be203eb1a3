use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "careervision-api"
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, get, test_state, FakeBilling, MemoryBillingStore};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_is_public() {
        let state = test_state(
            Arc::new(MemoryBillingStore::default()),
            Arc::new(FakeBilling::default()),
        );
        let response = get(state, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["service"], json!("careervision-api"));
    }
}
