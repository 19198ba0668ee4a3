use axum::extract::{Path, State};
use axum::Json;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/subscribers
pub async fn list_subscribers(
    State(app): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let list = blocking(&app, |svc| svc.subscribers()).await?;
    Ok(Json(list))
}

#[derive(serde::Deserialize)]
pub struct SubscribeBody {
    recipient: String,
}

/// POST /api/subscribers — add a recipient; adding twice is not an error.
pub async fn add_subscriber(
    State(app): State<AppState>,
    Json(body): Json<SubscribeBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = blocking(&app, move |svc| svc.subscribe(&body.recipient)).await?;
    Ok(Json(serde_json::json!({ "result": outcome })))
}

/// DELETE /api/subscribers/{recipient}
pub async fn remove_subscriber(
    State(app): State<AppState>,
    Path(recipient): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = blocking(&app, move |svc| svc.unsubscribe(&recipient)).await?;
    Ok(Json(serde_json::json!({ "result": outcome })))
}
