use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "login required".to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<crate::table::TableError> for AppError {
    fn from(err: crate::table::TableError) -> Self {
        Self::internal(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("PDF export failed: {err}"),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file {0} not found")]
    NotFound(PathBuf),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export for '{0}'")]
    Empty(String),
    #[error("PDF rendering error: {0}")]
    Render(String),
    #[error("failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
}
