use gerai_core::GeraiService;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GeraiService>,
}

impl AppState {
    pub fn new(service: Arc<GeraiService>) -> Self {
        Self { service }
    }
}
