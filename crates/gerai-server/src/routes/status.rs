use axum::extract::State;
use axum::Json;
use gerai_core::status::StatusSnapshot;

use crate::state::AppState;

/// GET /api/status — every stall in registry order. Outside operating hours
/// every stall reads closed.
pub async fn get_status(State(app): State<AppState>) -> Json<StatusSnapshot> {
    Json(app.service.status_snapshot())
}
