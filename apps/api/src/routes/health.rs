use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::llm_client::{is_placeholder_key, MODEL};
use crate::state::AppState;

/// GET /health
/// Reports version, model and whether an LLM key is configured. Never calls out.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "talent-api",
        "model": MODEL,
        "llm_key_configured": state
            .config
            .groq_api_key
            .as_deref()
            .is_some_and(|key| !is_placeholder_key(key)),
    }))
}
