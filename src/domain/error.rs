use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    ParseError(String),
    DatabaseError(String),
    IoError(String),
}

impl AppError {
    /// Message suitable for API clients. Internal failures are not echoed back.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(_)
            | AppError::ParseError(_)
            | AppError::DatabaseError(_)
            | AppError::IoError(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
