//! Error responses returned by the file handlers.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use std::fmt::Display;

use crate::filesystem::file_store::FileStoreError;

/// Prefix of every client-facing failure message.
pub const BAD_STATUS_PREFIX: &str = "Response has bad status, message: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An error whose message reads `Response has bad status, message: <detail>`.
    pub fn bad_status(code: ErrorCode, detail: impl Display) -> Self {
        Self::new(code, format!("{BAD_STATUS_PREFIX}{detail}"))
    }

    pub fn bad_request(detail: impl Display) -> Self {
        Self::bad_status(ErrorCode::BadRequest, detail)
    }

    pub fn not_found(detail: impl Display) -> Self {
        Self::bad_status(ErrorCode::NotFound, detail)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<FileStoreError> for ApiError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::InvalidName(_) => ApiError::bad_request(err),
            FileStoreError::NotFound(_) => ApiError::not_found(err),
            _ => {
                tracing::error!("Storage error: {}", err);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
