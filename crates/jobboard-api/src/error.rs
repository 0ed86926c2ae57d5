use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use jobboard_core::CoreError;
use serde_json::json;
use tracing::error;

/// Wrapper mapping core error kinds onto response status classes. The body
/// is always `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Unexpected non-core failure (join errors, hashing, filesystem).
    /// Logged here; the client only sees the generic unavailable message.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        error!("internal error: {}", err);
        ApiError(CoreError::Unavailable(anyhow::anyhow!("{}", err)))
    }

    pub fn unauthenticated() -> Self {
        ApiError(CoreError::Unauthenticated)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::DuplicateApplication
            | CoreError::AlreadySaved
            | CoreError::InvalidStatus(_)
            | CoreError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            // Matches the "job not found in saved jobs" contract.
            CoreError::NotSaved => StatusCode::NOT_FOUND,
            CoreError::Unavailable(source) => {
                error!("store failure: {:#}", source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}
