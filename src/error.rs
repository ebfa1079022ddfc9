use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{services::reconciler::SyncError, state::react::ChannelId};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No PUG is active in the channel.
    #[error("not running in channel {0}")]
    NotRunning(ChannelId),
    /// A PUG is already active in the channel.
    #[error("already running in channel {0}")]
    AlreadyRunning(ChannelId),
    /// Caller lacks the rights for the command.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Rendering the new state failed.
    #[error("sync failed")]
    Sync(#[from] SyncError),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Internal server error. The message is safe to show to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotRunning(_) => AppError::Conflict(err.to_string()),
            ServiceError::AlreadyRunning(_) => AppError::Conflict(err.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Sync(source) => {
                error!(error = ?source, "command failed while rendering");
                AppError::Internal("something went wrong".into())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;

    #[test]
    fn sync_failures_do_not_leak_details() {
        let err = ServiceError::Sync(SyncError::Backend(BackendError::Rejected(
            "secret channel detail".into(),
        )));
        let app = AppError::from(err);
        assert!(matches!(app, AppError::Internal(_)));
        assert!(!app.to_string().contains("secret"));
    }

    #[test]
    fn running_conflicts_map_to_409() {
        let response = AppError::from(ServiceError::AlreadyRunning(5)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
