//! Error types for the Vigil engine

use thiserror::Error;

/// Errors that can occur in the violation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    #[error("Detector failure: {0}")]
    DetectorFailure(String),

    #[error("Detector timed out after {0}ms")]
    DetectorTimeout(u64),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
