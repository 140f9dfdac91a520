//! Engagement core of the mutual-aid service.
//!
//! This crate owns the only stateful business rules of the platform:
//! - [`InteractionLedger`]: like/unlike toggles with an exact, transactionally
//!   recomputed like counter
//! - [`EnrollmentManager`]: moderated enrollment lifecycle that never admits
//!   more accepted participants than an offering's capacity
//! - [`ActivityLog`]: best-effort, append-only history written after commit
//!
//! Each operation runs one transaction against an [`aid_store::LedgerStore`]
//! and appends at most one activity entry once that transaction committed.

pub mod activity;
pub mod enrollment;
pub mod error;
pub mod interaction;
pub mod service;
pub mod view;

pub use activity::{ActivityError, ActivityLog, InMemoryActivityLog, TracingActivityLog};
pub use enrollment::{EnrollmentManager, MAX_NOTES_LEN};
pub use error::{EngagementError, EngagementResult, Entity};
pub use interaction::InteractionLedger;
pub use service::Engagement;
pub use view::{CapacityStats, EnrollmentDetail, EnrollmentView};
