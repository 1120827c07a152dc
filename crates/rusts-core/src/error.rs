//! Error types for rusts-core

use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Empty measurement name")]
    EmptyMeasurement,

    #[error("Empty tag key")]
    EmptyTagKey,

    #[error("Empty field key")]
    EmptyFieldKey,

    #[error("No fields provided")]
    NoFields,

    #[error("Non-finite float for field {0}")]
    NonFiniteField(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
