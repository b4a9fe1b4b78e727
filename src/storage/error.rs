//! Storage error types
//!
//! Defines the errors raised by the key-value layer and by identifier
//! validation. None of them are fatal: the identifier store recovers from
//! storage failures locally and rejects invalid input without side effects.

use thiserror::Error;

/// Errors that can occur in the key-value layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters that cannot be used as a record name
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backing store refused the operation (quota exceeded, read-only, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Rejection of a user-supplied identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Identifier too long: {len} characters (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("Malformed coin id: {0}")]
    MalformedCoinId(String),

    #[error("Malformed wallet address: {0}")]
    MalformedAddress(String),
}
