//! Error types for the offdays ledger.

use thiserror::Error;

/// Errors that can occur in ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Vacation not found: {0}")]
    VacationNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Calendar sync error: {0}")]
    Sync(String),

    #[error("Calendar sync timed out after {0}s")]
    SyncTimeout(u64),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
