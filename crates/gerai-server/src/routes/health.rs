use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /health — liveness plus whether the gate is currently open.
pub async fn get_health(State(app): State<AppState>) -> Json<serde_json::Value> {
    let service = &app.service;
    Json(serde_json::json!({
        "status": "ok",
        "name": service.config().name,
        "within_hours": service.gate().is_open(service.now()),
    }))
}
