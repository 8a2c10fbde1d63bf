use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ordenes_core::error::OrdenesError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. The body is always
/// `{"detail": "<message>"}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(OrdenesError::Validation(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        let Some(e) = self.0.downcast_ref::<OrdenesError>() else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            OrdenesError::OrderNotFound(_)
            | OrdenesError::AreaNotFound(_)
            | OrdenesError::AssignmentNotFound { .. } => StatusCode::NOT_FOUND,
            OrdenesError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrdenesError::Validation(_)
            | OrdenesError::InvalidState(_)
            | OrdenesError::InvalidPriority(_) => StatusCode::BAD_REQUEST,
            OrdenesError::AreaExists(_) | OrdenesError::TickInProgress => StatusCode::CONFLICT,
            OrdenesError::Storage(_)
            | OrdenesError::Io(_)
            | OrdenesError::Yaml(_)
            | OrdenesError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        }
        let body = serde_json::json!({ "detail": self.0.to_string() });
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

/// Map a `spawn_blocking` join failure into a 500.
pub(crate) fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError(anyhow::anyhow!("task join error: {e}"))
}
