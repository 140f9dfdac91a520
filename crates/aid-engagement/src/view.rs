use serde::Serialize;

use aid_types::{Capacity, CauseId, Enrollment, EnrollmentStatus, UserProfile};

/// What a requester is allowed to see of an offering's enrollments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum EnrollmentView {
    /// Owner view: every enrollment with user details, plus capacity stats.
    Full {
        offering: CauseId,
        enrollments: Vec<EnrollmentDetail>,
        stats: CapacityStats,
    },
    /// Everyone else: an aggregate count only.
    CountOnly { offering: CauseId, total: usize },
}

impl EnrollmentView {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full { .. })
    }

    /// Number of enrollments the view accounts for.
    pub fn total(&self) -> usize {
        match self {
            Self::Full { stats, .. } => stats.total,
            Self::CountOnly { total, .. } => *total,
        }
    }
}

/// One enrollment row decorated with the enrolled user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    /// `None` when the identity provider has no profile for the user.
    pub user_profile: Option<UserProfile>,
}

/// Occupancy figures of an offering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityStats {
    pub max_participants: u32,
    pub current_participants: u32,
    pub remaining: u32,
    pub pending: usize,
    pub total: usize,
}

impl CapacityStats {
    pub fn new(capacity: Capacity, enrollments: &[Enrollment]) -> Self {
        Self {
            max_participants: capacity.max_participants,
            current_participants: capacity.current_participants,
            remaining: capacity.remaining(),
            pending: enrollments
                .iter()
                .filter(|e| e.status == EnrollmentStatus::Pending)
                .count(),
            total: enrollments.len(),
        }
    }
}
