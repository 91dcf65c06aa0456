//! Error types for the deployer

use axum::http::StatusCode;
use thiserror::Error;

/// Process-level error type (startup, logging, listener)
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error raised while handling a single deployment request.
///
/// Each variant is one failure kind and carries the message rendered back to
/// the caller. The `Display` form is `<kind>: <message>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base directory or config file absent
    #[error("not found: {0}")]
    MissingConfig(String),

    /// Config file present but unreadable or malformed
    #[error("read error: {0}")]
    ReadError(String),

    /// Method not allowed or secret mismatched
    #[error("preconditions error: {0}")]
    PreconditionsError(String),

    /// Lock could not be taken
    #[error("setup error: {0}")]
    SetupError(String),

    /// Command failed to launch or exited non-zero
    #[error("execution error: {0}")]
    ExecutionError(String),
}

impl ConfigError {
    /// Short label of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::MissingConfig(_) => "not found",
            ConfigError::ReadError(_) => "read error",
            ConfigError::PreconditionsError(_) => "preconditions error",
            ConfigError::SetupError(_) => "setup error",
            ConfigError::ExecutionError(_) => "execution error",
        }
    }

    /// Message carried by the error
    pub fn message(&self) -> &str {
        match self {
            ConfigError::MissingConfig(msg)
            | ConfigError::ReadError(msg)
            | ConfigError::PreconditionsError(msg)
            | ConfigError::SetupError(msg)
            | ConfigError::ExecutionError(msg) => msg,
        }
    }

    /// HTTP status the dispatcher answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConfigError::MissingConfig(_) => StatusCode::NOT_FOUND,
            ConfigError::PreconditionsError(_) => StatusCode::BAD_REQUEST,
            ConfigError::ReadError(_)
            | ConfigError::SetupError(_)
            | ConfigError::ExecutionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
