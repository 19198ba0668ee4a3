use axum::extract::State;
use axum::Json;
use gerai_core::GeraiError;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct SweepBody {
    admin: String,
}

/// POST /api/sweep — run the end-of-day auto-close now. Admin only.
pub async fn run_sweep(
    State(app): State<AppState>,
    Json(body): Json<SweepBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let closed = blocking(&app, move |svc| {
        if !svc.is_admin(&body.admin) {
            return Err(GeraiError::NotAuthorized(body.admin));
        }
        tracing::info!(admin = %body.admin, "manual auto-close sweep");
        Ok(svc.run_auto_close_sweep())
    })
    .await?;
    Ok(Json(serde_json::json!({ "closed": closed })))
}
