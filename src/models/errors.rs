use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {resource}")]
    NotFoundError { resource: String },

    #[error("Unauthorized")]
    UnauthorizedError,

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

/// Body of every failed API response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

pub struct ErrorHandler;

impl ErrorHandler {
    /// Converts an AppError into the `{ok: false, ...}` envelope
    pub fn handle_error(error: &AppError) -> ErrorResponse {
        let error_message = match error {
            AppError::ValidationError { message } => message.clone(),
            AppError::NotFoundError { .. } => "Not found".to_string(),
            AppError::UnauthorizedError => "Unauthorized".to_string(),
            // Filesystem details stay in the logs.
            AppError::StorageError { .. } => "Storage operation failed".to_string(),
        };

        ErrorResponse {
            ok: false,
            error: error_message,
            code: error.error_code().to_string(),
        }
    }
}

impl AppError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFoundError { resource: resource.into() }
    }

    pub fn unauthorized() -> Self {
        AppError::UnauthorizedError
    }

    pub fn storage_failed(message: impl Into<String>) -> Self {
        AppError::StorageError { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFoundError { .. } => StatusCode::NOT_FOUND,
            AppError::UnauthorizedError => StatusCode::UNAUTHORIZED,
            AppError::StorageError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError { .. } => "VALIDATION_FAILED",
            AppError::NotFoundError { .. } => "NOT_FOUND",
            AppError::UnauthorizedError => "UNAUTHORIZED",
            AppError::StorageError { .. } => "STORAGE_FAILED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::StorageError { message } = &self {
            tracing::error!("Storage failure while handling request: {}", message);
        }

        let status = self.status_code();
        (status, Json(ErrorHandler::handle_error(&self))).into_response()
    }
}
