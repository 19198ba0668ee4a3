use axum::extract::{Path, State};
use axum::Json;
use gerai_core::admin::AdminOutcome;
use gerai_core::registry::Stall;
use gerai_core::voting::VoteOutcome;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/stalls — the registry.
pub async fn list_stalls(State(app): State<AppState>) -> Json<Vec<Stall>> {
    Json(app.service.registry().stalls().to_vec())
}

#[derive(serde::Deserialize)]
pub struct VoteBody {
    actor: String,
}

/// POST /api/stalls/{id}/vote — one citizen vote toward flipping the stall.
pub async fn vote_stall(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<VoteBody>,
) -> Result<Json<VoteOutcome>, AppError> {
    let actor = body.actor.trim().to_string();
    if actor.is_empty() {
        return Err(AppError::bad_request("actor is required"));
    }
    let outcome = blocking(&app, move |svc| svc.request_status_change(&id, &actor)).await?;
    Ok(Json(outcome))
}

#[derive(serde::Deserialize)]
pub struct AdminBody {
    admin: String,
    is_open: bool,
}

/// POST /api/stalls/{id}/admin — set a stall directly, at any hour.
pub async fn admin_stall(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AdminBody>,
) -> Result<Json<AdminOutcome>, AppError> {
    let outcome = blocking(&app, move |svc| {
        svc.request_admin_status_change(&id, body.is_open, &body.admin)
    })
    .await?;
    Ok(Json(outcome))
}
