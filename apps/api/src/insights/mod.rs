//! Saved insights and the job-market analytics cache.

pub mod handlers;
pub mod prompts;
pub mod store;

use serde_json::{json, Value};

use crate::llm_client::{parse_structured, ParsedReply};

/// Cache key for market snapshots: trimmed role, empty string for "any location".
pub fn market_key(role: &str, location: Option<&str>) -> (String, String) {
    (
        role.trim().to_string(),
        location.map(str::trim).unwrap_or_default().to_string(),
    )
}

/// Market snapshots are stored as JSON; unusable model output is kept under `raw`.
pub fn market_data(reply: &str) -> Value {
    match parse_structured(reply) {
        ParsedReply::Json(value) => value,
        ParsedReply::Text(text) => json!({ "raw": text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_key_normalizes_missing_location() {
        assert_eq!(
            market_key(" Data Engineer ", None),
            ("Data Engineer".to_string(), String::new())
        );
        assert_eq!(
            market_key("Data Engineer", Some(" Berlin ")),
            ("Data Engineer".to_string(), "Berlin".to_string())
        );
    }

    #[test]
    fn test_market_data_wraps_unparseable_reply() {
        assert_eq!(market_data("demand is high"), json!({ "raw": "demand is high" }));
        assert_eq!(
            market_data("{\"demand_level\": \"high\"}"),
            json!({ "demand_level": "high" })
        );
    }
}
