//! Foundation types for the mutual-aid engagement service.
//!
//! This crate provides the identifiers and row types shared by the store,
//! the engagement components, and the HTTP surface. Every other `aid` crate
//! depends on `aid-types`.
//!
//! # Key Types
//!
//! - [`UserId`], [`CauseId`], [`EnrollmentId`]: UUID v7 identifiers
//! - [`Cause`]: a request or offer; carries the denormalized like counter and,
//!   for offerings, a [`Capacity`]
//! - [`LikeInteraction`]: one user's like state on one cause
//! - [`Enrollment`] / [`EnrollmentStatus`]: moderated registration lifecycle
//! - [`ActivityLogEntry`]: immutable engagement history record

pub mod activity;
pub mod cause;
pub mod enrollment;
pub mod error;
pub mod ids;
pub mod like;
pub mod user;

pub use activity::{ActivityKind, ActivityLogEntry};
pub use cause::{Capacity, Cause, CauseKind};
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use error::TypeError;
pub use ids::{CauseId, EnrollmentId, UserId};
pub use like::{LikeInteraction, LikeStatus};
pub use user::{Actor, UserProfile};

/// Wall-clock timestamp used on every row.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
