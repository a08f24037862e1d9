use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::server::AppState;

/// Health check endpoint handler.
///
/// Liveness only: answers without touching the store, so load balancers and
/// container orchestrators can tell the process is up.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// # Response Format
/// ```json
/// {
///   "status": "pong"
/// }
/// ```
///
/// # Examples
/// ```bash
/// curl http://localhost:8080/ping
/// # Response: {"status":"pong"}
/// ```
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

/// Readiness endpoint: 200 when the credential store answers, 503 otherwise.
pub async fn health(State(app_state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let backend = app_state.store.backend();
    match app_state.store.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "store": backend }))),
        Err(e) => {
            tracing::error!("Health check failed for {} store: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "store": backend })),
            )
        }
    }
}
