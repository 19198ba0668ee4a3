pub mod auth;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;

use auth::{auth_middleware, ApiAuth};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use gerai_core::GeraiService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
///
/// Health, status and the stall list are public. Voting, admin overrides,
/// subscriber management and the manual sweep require `auth`'s token.
pub fn build_router(service: Arc<GeraiService>, auth: ApiAuth) -> Router {
    let app_state = state::AppState::new(service);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let guarded = Router::new()
        // Stalls
        .route("/api/stalls/{id}/vote", post(routes::stalls::vote_stall))
        .route("/api/stalls/{id}/admin", post(routes::stalls::admin_stall))
        // Subscribers
        .route(
            "/api/subscribers",
            get(routes::subscribers::list_subscribers).post(routes::subscribers::add_subscriber),
        )
        .route(
            "/api/subscribers/{recipient}",
            delete(routes::subscribers::remove_subscriber),
        )
        // Auto-close
        .route("/api/sweep", post(routes::sweep::run_sweep))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(routes::health::get_health))
        .route("/api/status", get(routes::status::get_status))
        .route("/api/stalls", get(routes::stalls::list_stalls))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the HTTP API on `0.0.0.0:{port}` until the process exits.
pub async fn serve(service: Arc<GeraiService>, port: u16, auth: ApiAuth) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(service, listener, auth).await
}

/// Serve on a pre-bound listener, so the caller can read the actual port
/// when binding to port 0.
pub async fn serve_on(
    service: Arc<GeraiService>,
    listener: tokio::net::TcpListener,
    auth: ApiAuth,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(service, auth);

    tracing::info!("gerai API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
