use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gerai_core::GeraiError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 400 Bad Request errors
// ---------------------------------------------------------------------------

/// Carries a request-shape problem (missing field, blank actor) through the
/// `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

fn status_for(err: &GeraiError) -> StatusCode {
    match err {
        GeraiError::UnknownStall(_) => StatusCode::NOT_FOUND,
        GeraiError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        GeraiError::InvalidStallId(_)
        | GeraiError::DuplicateStall(_)
        | GeraiError::InvalidRecipient(_)
        | GeraiError::ConfigNotFound(_)
        | GeraiError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        GeraiError::Io(_) | GeraiError::Yaml(_) | GeraiError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<BadRequestError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<GeraiError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::warn!("request failed: {:#}", self.0);
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stall_maps_to_404() {
        let err = AppError(GeraiError::UnknownStall("x".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_authorized_maps_to_403() {
        let err = AppError(GeraiError::NotAuthorized("bob".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_recipient_maps_to_400() {
        let err = AppError(GeraiError::InvalidRecipient(" ".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let err = AppError::bad_request("actor is required");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_error_maps_to_500() {
        let err = AppError(GeraiError::Io(std::io::Error::other("disk full")).into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("boom"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
