/*
 * Responsibility
 * - GET /health (疎通用)
 * - public + skip_authorization で登録し、ゲートを素通りすることの確認にも使う
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
