use gerai_core::GeraiService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Time left until the service's next closing boundary.
pub fn until_next_close(service: &GeraiService) -> Duration {
    (service.next_auto_close() - service.now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Run the auto-close sweep at every closing boundary, forever.
pub fn spawn_auto_close(service: Arc<GeraiService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_close(&service);
            tracing::debug!(
                next = %service.next_auto_close(),
                secs = wait.as_secs(),
                "auto-close scheduled"
            );
            tokio::time::sleep(wait).await;
            let svc = service.clone();
            match tokio::task::spawn_blocking(move || svc.run_auto_close_sweep()).await {
                Ok(closed) => tracing::info!(closed = ?closed, "auto-close ran"),
                Err(e) => tracing::warn!("auto-close task failed: {e}"),
            }
            // Step past the boundary so the same instant is not swept twice.
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    })
}
