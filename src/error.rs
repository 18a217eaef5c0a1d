//! Request-level error type and its HTTP mapping.
//!
//! Resolution misses, validation failures and authorization failures never
//! reach this type: they are recovered inside the dispatcher or the handlers.
//! What remains is mapped to a response in exactly one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::persistence::DbError;
use crate::security::PasswordError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),

    #[error("view does not exist: {0}")]
    ViewNotFound(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("operation `{operation}` requires parameter #{position}")]
    MissingParameter {
        operation: &'static str,
        position: usize,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("handler `{handler}` has no operation `{operation}`")]
    UnknownOperation { handler: String, operation: String },

    #[error("request task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingParameter { .. } | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_)
            | AppError::ViewNotFound(_)
            | AppError::Template(_)
            | AppError::UnknownOperation { .. }
            | AppError::Task(_)
            | AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body shown to the client.
    fn public_message(&self) -> &'static str {
        match self {
            AppError::ViewNotFound(_) => "View does not exist",
            AppError::MissingParameter { .. } | AppError::NotFound(_) => "Not Found",
            _ => "Something went wrong",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, self.public_message()).into_response()
    }
}
