use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cqrs_es::persist::PersistenceError;
use cqrs_es::AggregateError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Every error leaves the API as `{ "message": ... }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!(status = %status, "{}", self);
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<domain::Error> for ApiError {
    fn from(err: domain::Error) -> Self {
        match err {
            domain::Error::NotFound { entity } => ApiError::not_found(entity),
            domain::Error::UnknownStep { .. } => ApiError::NotFound(err.to_string()),
            domain::Error::Uniqueness { .. } | domain::Error::InvalidStateTransition { .. } => {
                ApiError::Conflict(err.to_string())
            }
            domain::Error::Validation { message } => ApiError::BadRequest(message),
        }
    }
}

impl From<AggregateError<domain::Error>> for ApiError {
    fn from(err: AggregateError<domain::Error>) -> Self {
        match err {
            AggregateError::UserError(err) => err.into(),
            AggregateError::AggregateConflict => {
                ApiError::Conflict("The prescription was changed concurrently".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Malformed upload: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
