//! Error types for Agent Designer
//!
//! This module defines the error type shared by the designer, the storage
//! backends and the configuration loader. HTTP-facing errors live in
//! [`crate::api::ApiError`] and are built from these.

use thiserror::Error;

/// Agent Designer error types
#[derive(Debug, Error)]
pub enum Error {
    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Relational storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A simulation or retrain run was cancelled before it finished
    #[error("Run cancelled")]
    Cancelled,

    /// Another run of the same kind is still in progress
    #[error("Busy: {0}")]
    Busy(String),

    /// Internal errors with custom messages
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for Agent Designer operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err.to_string())
    }
}
