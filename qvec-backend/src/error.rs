//! Error types for backend operations

use qvec_core::{EngineError, ErrorKind};
use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors crossing the backend boundary
#[derive(Error, Debug)]
pub enum BackendError {
    /// Error surfaced by the engine core
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Request carried an operation the backend cannot interpret
    #[error("malformed operation: {0}")]
    MalformedOperation(String),

    /// Invalid request- or backend-level configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Streaming protocol violated (setup framing)
    #[error("stream protocol violation: {0}")]
    StreamProtocol(String),

    /// Wire serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    /// Map onto the caller-visible error categories
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Engine(inner) => inner.kind(),
            BackendError::MalformedOperation(_)
            | BackendError::InvalidConfiguration(_)
            | BackendError::StreamProtocol(_) => ErrorKind::InvalidArgument,
            BackendError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_keep_their_kind() {
        let err = BackendError::from(EngineError::AcceleratorUnavailable);
        assert_eq!(err.kind(), ErrorKind::AcceleratorUnavailable);

        let err = BackendError::from(EngineError::InvalidQubitCount(31));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_protocol_errors_are_invalid_argument() {
        let err = BackendError::StreamProtocol("gate before setup".into());
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
