//! Error types for chunkflow.

use thiserror::Error;

/// The main error type for chunkflow core operations.
#[derive(Error, Debug)]
pub enum ChunkflowError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A fragment did not have the shape its tag requires.
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),
}

impl ChunkflowError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid fragment error.
    pub fn invalid_fragment(message: impl Into<String>) -> Self {
        Self::InvalidFragment(message.into())
    }
}

/// Result type alias using ChunkflowError.
pub type Result<T> = std::result::Result<T, ChunkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChunkflowError::configuration("batch size must be set");
        assert_eq!(err.to_string(), "Configuration error: batch size must be set");

        let err = ChunkflowError::invalid_fragment("missing toolCall");
        assert_eq!(err.to_string(), "Invalid fragment: missing toolCall");
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ChunkflowError = serde_err.into();
        assert!(matches!(err, ChunkflowError::Serialization(_)));
    }
}
