//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pockethub_domain::error::{PocketError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`PocketError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PocketError);

impl ApiError {
    /// A path segment that is not a valid identifier.
    #[must_use]
    pub fn invalid_id(raw: &str) -> Self {
        Self(ValidationError::InvalidId(raw.to_string()).into())
    }
}

impl From<PocketError> for ApiError {
    fn from(err: PocketError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PocketError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            PocketError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            PocketError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            PocketError::Upstream(err) => {
                tracing::warn!(error = %err, "upstream error");
                (StatusCode::BAD_GATEWAY, self.0.to_string())
            }
            PocketError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
