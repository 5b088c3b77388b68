use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// Health check endpoint to verify server status
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
