//! Error types for session DV aggregation

use thiserror::Error;

/// Errors that can occur while parsing, aggregating or persisting session metrics
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse session context: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Invalid engine configuration: {0}")]
    ConfigError(String),

    #[error("Failed to load computed-session state: {0}")]
    StateError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
