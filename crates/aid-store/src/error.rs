use std::time::Duration;

/// Errors from ledger store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A row lock could not be acquired within the configured timeout.
    #[error("timed out after {waited:?} waiting for lock on {row}")]
    LockTimeout { row: String, waited: Duration },

    /// A write touched a row the transaction has not locked.
    #[error("write to {row} without holding its lock")]
    NotLocked { row: String },

    /// A unique constraint would be violated.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A row referenced by a write does not exist.
    #[error("row not found: {0}")]
    MissingRow(String),

    /// A stored row would break a schema invariant.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
