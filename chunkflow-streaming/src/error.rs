//! Streaming errors.

use thiserror::Error;

/// Errors raised while decoding a byte stream into fragments.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading the byte source failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single line grew past the decoder's buffer limit.
    #[error("Buffer overflow: pending line exceeds {limit} bytes")]
    BufferOverflow {
        /// The limit in bytes.
        limit: usize,
    },
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = StreamError::BufferOverflow { limit: 16 };
        assert_eq!(err.to_string(), "Buffer overflow: pending line exceeds 16 bytes");
    }

    #[test]
    fn test_from_io_error() {
        let err: StreamError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(matches!(err, StreamError::Io(_)));
        assert_eq!(err.to_string(), "IO error: reset");
    }
}
