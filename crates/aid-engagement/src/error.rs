use std::fmt;

use aid_store::StoreError;
use aid_types::{CauseId, EnrollmentId, EnrollmentStatus, UserId};

/// Kind of row a [`EngagementError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Cause,
    Offering,
    Enrollment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cause => write!(f, "cause"),
            Self::Offering => write!(f, "offering"),
            Self::Enrollment => write!(f, "enrollment"),
        }
    }
}

/// Errors produced by engagement operations.
///
/// `Duplicate`, `InvalidTransition` and `CapacityExceeded` are business-rule
/// conflicts and must reach the caller as such. `Internal` carries detail for
/// server-side logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("user {user} already has an enrollment for offering {offering}")]
    Duplicate { user: UserId, offering: CauseId },

    #[error("enrollment cannot move from {from} to {to}")]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },

    #[error("offering {offering} is full ({max} participants)")]
    CapacityExceeded { offering: CauseId, max: u32 },

    #[error("not permitted: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngagementError {
    pub fn cause_not_found(id: &CauseId) -> Self {
        Self::NotFound {
            entity: Entity::Cause,
            id: id.to_string(),
        }
    }

    pub fn offering_not_found(id: &CauseId) -> Self {
        Self::NotFound {
            entity: Entity::Offering,
            id: id.to_string(),
        }
    }

    pub fn enrollment_not_found(id: &EnrollmentId) -> Self {
        Self::NotFound {
            entity: Entity::Enrollment,
            id: id.to_string(),
        }
    }

    /// Stable name of the error kind, as exposed on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::NotFound { .. } => "NotFound",
            Self::Duplicate { .. } => "Duplicate",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::CapacityExceeded { .. } => "CapacityExceeded",
            Self::Forbidden(_) => "Forbidden",
            Self::Validation(_) => "ValidationError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Whether this is a business-rule conflict (HTTP 409 class).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Duplicate { .. } | Self::InvalidTransition { .. } | Self::CapacityExceeded { .. }
        )
    }
}

impl From<StoreError> for EngagementError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type EngagementResult<T> = Result<T, EngagementError>;
