use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{CauseId, EnrollmentId, UserId};
use crate::Timestamp;

/// Lifecycle state of an enrollment.
///
/// ```text
/// pending ──► accepted ──► completed
///    │           │
///    │           └──────► cancelled
///    ├──► rejected
///    └──► cancelled
/// ```
///
/// `rejected`, `completed` and `cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether the state machine permits `self -> next`.
    ///
    /// Capacity is not considered here; `pending -> accepted` is additionally
    /// gated on headroom at commit time.
    pub fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// Whether this status occupies a seat.
    pub fn holds_seat(self) -> bool {
        self == Self::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TypeError::UnknownStatus(s.to_string()))
    }
}

/// A user's registration against an offering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user: UserId,
    pub offering: CauseId,
    pub status: EnrollmentStatus,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Enrollment {
    /// A fresh `pending` request.
    pub fn request(user: UserId, offering: CauseId, notes: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: EnrollmentId::new(),
            user,
            offering,
            status: EnrollmentStatus::Pending,
            notes,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use EnrollmentStatus::*;

    const ALLOWED: [(EnrollmentStatus, EnrollmentStatus); 5] = [
        (Pending, Accepted),
        (Pending, Rejected),
        (Pending, Cancelled),
        (Accepted, Completed),
        (Accepted, Cancelled),
    ];

    #[test]
    fn transition_table_is_exact() {
        for from in EnrollmentStatus::ALL {
            for to in EnrollmentStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    ALLOWED.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Rejected, Completed, Cancelled] {
            assert!(from.is_terminal());
            assert!(EnrollmentStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(!Pending.is_terminal());
        assert!(!Accepted.is_terminal());
    }

    #[test]
    fn completed_cannot_return_to_pending() {
        assert!(!Completed.can_transition_to(Pending));
    }

    #[test]
    fn status_parses_from_wire_names() {
        for status in EnrollmentStatus::ALL {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>().unwrap(), status);
        }
        assert_eq!(
            "banned".parse::<EnrollmentStatus>().unwrap_err(),
            TypeError::UnknownStatus("banned".into())
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
    }

    #[test]
    fn new_request_is_pending() {
        let e = Enrollment::request(UserId::new(), CauseId::new(), Some("vegetarian".into()));
        assert_eq!(e.status, Pending);
        assert!(e.admin_notes.is_none());
        assert_eq!(e.created_at, e.updated_at);
    }

    fn any_status() -> impl Strategy<Value = EnrollmentStatus> {
        prop::sample::select(EnrollmentStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn nothing_transitions_into_pending(from in any_status()) {
            prop_assert!(!from.can_transition_to(Pending));
        }

        #[test]
        fn only_accepted_holds_a_seat(status in any_status()) {
            prop_assert_eq!(status.holds_seat(), status == Accepted);
        }
    }
}
