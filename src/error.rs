use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{repository::RepositoryError, storage::StorageError};

/// ApiError
///
/// The single failure type returned by every handler and extractor. Each variant maps onto
/// one HTTP status code, and every failure is rendered with the same JSON envelope:
/// `{"status": "fail", "error": "<message>"}`.
///
/// Database and storage failures are logged here and replaced by a generic message so that
/// driver details never leak to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    /// The status code this error is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Repository(RepositoryError::Duplicate(_)) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Repository(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// ErrorBody
///
/// Wire shape of a failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Server Error".to_string()
            }
            ApiError::Repository(RepositoryError::Duplicate(what)) => {
                format!("{} is already taken", what)
            }
            ApiError::Repository(e) => {
                tracing::error!("Repository error: {:?}", e);
                "Server Error".to_string()
            }
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                "Storage Error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            status: "fail".to_string(),
            error: message,
        });

        (status, body).into_response()
    }
}
