// Central Error Type for the Application

use crate::domain::DomainError;
use crate::port::RenderError;
use serde::Serialize;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Code generation failed: {0}")]
    GenerationFailed(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, caller-facing classification of an [`AppError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    GenerationFailed,
    ExecutionFailed,
    Timeout,
    ArtifactNotFound,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Domain(DomainError::StateRegression { .. }) => ErrorKind::Conflict,
            AppError::Domain(_) | AppError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            AppError::Render(RenderError::ExecutionFailed { .. }) => ErrorKind::ExecutionFailed,
            AppError::Render(RenderError::Timeout { .. }) => ErrorKind::Timeout,
            AppError::Render(RenderError::ArtifactNotFound { .. }) => ErrorKind::ArtifactNotFound,
            AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-equivalent status for transports that want one
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::GenerationFailed
            | ErrorKind::ExecutionFailed
            | ErrorKind::Timeout
            | ErrorKind::ArtifactNotFound
            | ErrorKind::Internal => 500,
        }
    }

    /// Captured renderer diagnostics, when the error carries any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            AppError::Render(e) => e.diagnostics(),
            _ => None,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
