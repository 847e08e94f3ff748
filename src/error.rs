use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

/// Wire shape for every externally visible failure. Clients always get a
/// machine-readable `error` kind, never a bare string or an opaque 500.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub troubleshooting: Option<String>,
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            troubleshooting: None,
            retry_after: None,
        }
    }

    pub fn with_troubleshooting(mut self, text: impl Into<String>) -> Self {
        self.troubleshooting = Some(text.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("not_found", "The requested resource was not found."),
            ),
            AppError::Validation(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorBody::new("validation_error", message))
            }
            AppError::Config(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("internal_error", "The service is misconfigured.")
                    .with_troubleshooting(message),
            ),
            AppError::Database(err) => {
                tracing::error!("database error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(
                        "internal_error",
                        "A storage operation failed. Please try again.",
                    )
                    .with_troubleshooting(
                        "Check the DATABASE_URL and that the database file is writable.",
                    ),
                )
            }
            AppError::Io(err) => {
                tracing::error!("io error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("internal_error", "An I/O operation failed."),
                )
            }
            AppError::Http(err) => {
                tracing::error!("upstream http error: {err:?}");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new(
                        "internal_error",
                        "An upstream service could not be reached.",
                    ),
                )
            }
            AppError::Other(err) => {
                tracing::error!("unhandled error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("internal_error", "An unexpected error occurred."),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
