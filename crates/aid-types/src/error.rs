use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown enrollment status: {0}")]
    UnknownStatus(String),

    #[error("unknown activity kind: {0}")]
    UnknownActivityKind(String),

    #[error("unknown cause kind: {0}")]
    UnknownCauseKind(String),

    #[error("invalid capacity: {current} participants exceed maximum of {max}")]
    InvalidCapacity { current: u32, max: u32 },
}
