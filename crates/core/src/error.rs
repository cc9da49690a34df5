// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Missing or placeholder credentials, invalid settings. Process-fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection, timeout or body-stream failure on an outbound call
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP response from the entity store or input host
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
