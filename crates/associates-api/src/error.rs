//! API error mapping
//!
//! | error                | status |
//! |----------------------|--------|
//! | invalid token        | 404    |
//! | token already used   | 410    |
//! | validation failed    | 422    |
//! | store unavailable    | 503    |

use associates_core::{DirectoryError, FieldError, StoreError, SubmissionError, TokenError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::response::{ApiResponse, ErrorInfo};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InvalidToken,
    TokenAlreadyUsed,
    Conflict(String),
    ValidationFailed(Vec<FieldError>),
    Unavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::TokenAlreadyUsed => "TOKEN_ALREADY_USED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::Unavailable(_) => "STORE_UNAVAILABLE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::InvalidToken => StatusCode::NOT_FOUND,
            ApiError::TokenAlreadyUsed => StatusCode::GONE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_info(&self) -> ErrorInfo {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unavailable(msg)
            | ApiError::InternalError(msg) => ErrorInfo::new(self.error_code(), msg),
            ApiError::InvalidToken => {
                ErrorInfo::new(self.error_code(), "Token is unknown, expired or already used")
            }
            ApiError::TokenAlreadyUsed => {
                ErrorInfo::new(self.error_code(), "Token was consumed by another submission")
            }
            ApiError::ValidationFailed(fields) => {
                ErrorInfo::new(self.error_code(), "Submission validation failed")
                    .with_fields(fields)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = ?self, "Request failed");
        }
        let response = ApiResponse::<()>::error(self.error_info(), uuid::Uuid::new_v4().to_string());
        (status, Json(response)).into_response()
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::InvalidToken => ApiError::InvalidToken,
            SubmissionError::TokenAlreadyUsed => ApiError::TokenAlreadyUsed,
            SubmissionError::ValidationFailed(fields) => ApiError::ValidationFailed(fields),
            SubmissionError::StoreUnavailable(msg) => ApiError::Unavailable(msg),
            SubmissionError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Associate '{id}' not found")),
            StoreError::Conflict { .. } | StoreError::Duplicate(_) => {
                ApiError::Conflict(err.to_string())
            }
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Invalid(fields) => ApiError::ValidationFailed(fields),
            DirectoryError::Store(store) => store.into(),
            DirectoryError::Token(TokenError::Store(store)) => store.into(),
            DirectoryError::Token(TokenError::NotFound) => ApiError::InvalidToken,
            DirectoryError::Token(err @ TokenError::NotPending { .. }) => {
                ApiError::Conflict(err.to_string())
            }
            DirectoryError::Token(err @ TokenError::Generation(_)) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}
