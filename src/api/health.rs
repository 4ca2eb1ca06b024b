use axum::Json;
use serde_json::json;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ready() -> Json<serde_json::Value> {
    Json(json!({ "status": "ready" }))
}
