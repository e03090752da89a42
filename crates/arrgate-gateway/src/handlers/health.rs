//! Liveness endpoint
//!
//! GET /health - the process is up and serving

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// GET /health - liveness probe
///
/// Always returns 200 OK while the process is alive.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
