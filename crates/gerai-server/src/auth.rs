use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Shared API token guarding the routes that change state or expose
/// subscriber ids.
///
/// Identities in request bodies (`actor`, `admin`) are only attribution; the
/// token is what proves the caller is the trusted front end or operator.
#[derive(Clone, Default)]
pub struct ApiAuth {
    token: Option<Arc<str>>,
}

impl ApiAuth {
    /// No token configured: every guarded request is refused.
    pub fn locked() -> Self {
        Self { token: None }
    }

    /// Guarded requests must carry `Authorization: Bearer <token>`.
    /// A blank token is treated as no token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Self::locked();
        }
        Self {
            token: Some(Arc::from(token)),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.token.is_none()
    }

    fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.token, presented) {
            (Some(token), Some(presented)) => token.as_ref() == presented,
            _ => false,
        }
    }
}

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Axum middleware for the guarded routes.
///
/// 1. No token configured → 401 telling the operator how to enable the API
/// 2. Bearer token matches → passthrough
/// 3. Otherwise → 401
pub async fn auth_middleware(State(auth): State<ApiAuth>, req: Request, next: Next) -> Response {
    if auth.accepts(bearer(&req)) {
        return next.run(req).await;
    }
    let message = if auth.is_locked() {
        "API token not configured; start `gerai serve` with GERAI_API_TOKEN"
    } else {
        "unauthorized"
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::post, Router};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn test_app(auth: ApiAuth) -> Router {
        Router::new()
            .route("/api/guarded", post(ok_handler))
            .layer(middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn request(authorization: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri("/api/guarded");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn matching_bearer_passes_through() {
        let resp = test_app(ApiAuth::with_token("secret"))
            .oneshot(request(Some("Bearer secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_header_returns_401() {
        let resp = test_app(ApiAuth::with_token("secret"))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_returns_401() {
        let resp = test_app(ApiAuth::with_token("secret"))
            .oneshot(request(Some("Bearer guess")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_returns_401() {
        let resp = test_app(ApiAuth::with_token("secret"))
            .oneshot(request(Some("secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn locked_refuses_everything() {
        let resp = test_app(ApiAuth::locked())
            .oneshot(request(Some("Bearer ")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn blank_token_is_locked() {
        assert!(ApiAuth::with_token("  ").is_locked());
        assert!(!ApiAuth::with_token("x").is_locked());
    }
}
