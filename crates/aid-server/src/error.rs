use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use aid_engagement::EngagementError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Engagement(#[from] EngagementError),

    #[error("store error: {0}")]
    Store(#[from] aid_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Shorthand for a malformed-input rejection.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Engagement(EngagementError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engagement(err) => match err {
                EngagementError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                EngagementError::NotFound { .. } => StatusCode::NOT_FOUND,
                EngagementError::Duplicate { .. }
                | EngagementError::InvalidTransition { .. }
                | EngagementError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                EngagementError::Forbidden(_) => StatusCode::FORBIDDEN,
                EngagementError::Validation(_) => StatusCode::BAD_REQUEST,
                EngagementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Engagement(err) => err.kind(),
            _ => "InternalError",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let body = json!({ "error": self.kind(), "message": message });
        (status, Json(body)).into_response()
    }
}
