//! Client error types.

use chunkflow_streaming::StreamError;
use thiserror::Error;

/// Errors raised while connecting to or reading from a backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("HTTP error: {status} {status_text}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The body could not be decoded.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ClientError {
    /// Create an HTTP status error.
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        Self::Http {
            status,
            status_text: status_text.into(),
        }
    }

    /// Check if this error came from the transport rather than the body.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Request(_))
    }

    /// Get the HTTP status, if the backend answered with one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|status| status.as_u16()),
            Self::Stream(_) => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error() {
        let err = ClientError::http(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP error: 503 Service Unavailable");
        assert!(err.is_transport());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_stream_error_is_not_transport() {
        let err: ClientError = StreamError::BufferOverflow { limit: 8 }.into();
        assert!(!err.is_transport());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Buffer overflow: pending line exceeds 8 bytes");
    }
}
