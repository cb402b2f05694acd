//! Liveness endpoint.

use axum::Json;
use serde_json::{json, Value};

/// GET / -- report that the server is up.
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "running" }))
}
