use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rallypoint_core::Error;
use serde_json::json;

/// Error returned by every handler, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] Error);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::Validation(_) | Error::AlreadySigned => StatusCode::BAD_REQUEST,
            Error::PetitionNotFound(_) => StatusCode::NOT_FOUND,
            Error::StoreUnavailable(_) | Error::InvariantViolation(_) | Error::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "request failed");
            match self.0 {
                Error::StoreUnavailable(_) => "Storage is temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
