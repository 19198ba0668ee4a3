pub mod health;
pub mod stalls;
pub mod status;
pub mod subscribers;
pub mod sweep;

use crate::error::AppError;
use crate::state::AppState;
use gerai_core::GeraiService;

/// Run a service call on the blocking pool. Subscriber stores may touch the
/// disk and notifier fan-out runs inline after a commit.
pub(crate) async fn blocking<T, F>(app: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&GeraiService) -> gerai_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = app.service.clone();
    let out = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(out)
}
