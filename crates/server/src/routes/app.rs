use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use common::types::Health;

use crate::state::ServerState;

#[utoipa::path(get, path = "/api", tag = "health", responses((status = 200, description = "API banner")))]
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Auto Shop API is running!",
        "status": "running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[utoipa::path(get, path = "/api/health", tag = "health", responses((status = 200, description = "Liveness", body = crate::openapi::HealthResponse)))]
pub async fn health(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
