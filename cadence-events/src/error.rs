//! Error types for the event system.

use cadence_config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Result type for event system operations.
pub type Result<T> = std::result::Result<T, EventError>;

/// Errors returned to callers of the event system.
///
/// Handler failures never show up here; they are reported through
/// [`EventResult`](crate::EventResult).
#[derive(Debug, Error)]
pub enum EventError {
    /// Event type outside the closed enumeration
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// Handler registration rejected
    #[error("Invalid handler: {0}")]
    InvalidHandler(String),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of a single handler attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Invalid payload: {0}")]
    Payload(String),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
