//! Liveness endpoint — `GET /health`.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::http::AppState;

/// Health response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub uptime_seconds: i64,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = chrono::Utc::now().timestamp();
    Json(HealthResponse {
        ok: true,
        version: state.version.clone(),
        uptime_seconds: (now - state.start_time).max(0),
    })
}
