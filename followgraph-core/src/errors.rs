//! Error types shared across the follow graph core

use serde::Serialize;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Machine-readable error category surfaced to transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in graph, access, and collection operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// Missing or invalid consumer/token credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not entitled
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown actor nickname or id
    #[error("Actor not found: {0}")]
    ActorNotFound(String),

    /// Malformed request parameters or body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate registration
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GraphError {
    /// Category used for status mapping and error bodies
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::Unauthorized(_) => ErrorKind::Unauthorized,
            GraphError::Forbidden(_) => ErrorKind::Forbidden,
            GraphError::ActorNotFound(_) => ErrorKind::NotFound,
            GraphError::BadRequest(_) => ErrorKind::BadRequest,
            GraphError::Conflict(_) => ErrorKind::Conflict,
            GraphError::Store(_) | GraphError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(e: rusqlite::Error) -> Self {
        GraphError::Store(e.to_string())
    }
}

impl From<r2d2::Error> for GraphError {
    fn from(e: r2d2::Error) -> Self {
        GraphError::Store(format!("Failed to get connection: {}", e))
    }
}

impl From<tokio::task::JoinError> for GraphError {
    fn from(e: tokio::task::JoinError) -> Self {
        GraphError::Internal(format!("Task join error: {}", e))
    }
}

impl From<crate::core_admission::AdmissionError> for GraphError {
    fn from(e: crate::core_admission::AdmissionError) -> Self {
        GraphError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::ActorNotFound("nonexistent".to_string());
        assert_eq!(err.to_string(), "Actor not found: nonexistent");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err: GraphError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, GraphError::Store(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
