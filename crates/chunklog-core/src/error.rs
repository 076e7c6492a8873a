//! Error types for log storage and search
//!
//! `NotFound` is an ordinary outcome for callers asking about unknown logs or
//! refs. `Corrupt` means the blob layer handed back bytes that do not match
//! their content hash and must never be tolerated silently.

use thiserror::Error;

/// What kind of entity a [`LogError::NotFound`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A log record in the metadata store
    Log,
    /// A named ref in the blob store
    Ref,
    /// A content-addressed blob
    Blob,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Ref => f.write_str("ref"),
            Self::Blob => f.write_str("blob"),
        }
    }
}

/// Error type for log storage, indexing and search
#[derive(Error, Debug, Clone)]
pub enum LogError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Corrupted blob {hash}: content hashes to {actual}")]
    Corrupt { hash: String, actual: String },

    #[error("Concurrent update of {name} rejected (current: {actual})")]
    Conflict { name: String, actual: String },

    #[error("Log {0} is complete and cannot be appended to")]
    LogComplete(String),

    #[error("Invalid ref name: {0}")]
    InvalidRef(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Result type for log operations
pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    /// Create a not-found error for a log id
    pub fn log_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Log,
            id: id.to_string(),
        }
    }

    /// Create a not-found error for a ref name
    pub fn ref_not_found(name: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Ref,
            id: name.to_string(),
        }
    }

    /// Create a not-found error for a blob hash
    pub fn blob_not_found(hash: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Blob,
            id: hash.to_string(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a serialization error
    pub fn serialization<S: ToString>(msg: S) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Create a deserialization error
    pub fn deserialization<S: ToString>(msg: S) -> Self {
        Self::Deserialization(msg.to_string())
    }

    /// Check if the error reports an absent entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the error indicates data corruption
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt { .. } | Self::Deserialization(_))
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Conflict { .. })
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_not_found() {
        let err = LogError::log_not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "log not found: abc");
        assert!(!LogError::Cancelled.is_not_found());
    }

    #[test]
    fn test_error_corruption() {
        assert!(LogError::Corrupt {
            hash: "aa".to_string(),
            actual: "bb".to_string()
        }
        .is_corruption());

        assert!(!LogError::Io("disk".to_string()).is_corruption());
    }

    #[test]
    fn test_error_retryable() {
        assert!(LogError::Io("timeout".to_string()).is_retryable());
        assert!(!LogError::Cancelled.is_retryable());
        assert!(!LogError::blob_not_found("00").is_retryable());
    }
}
