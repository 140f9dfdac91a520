use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{CauseId, UserId};
use crate::Timestamp;

/// Whether a cause asks for help or offers it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CauseKind {
    Request,
    Offer,
}

impl fmt::Display for CauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Offer => write!(f, "offer"),
        }
    }
}

impl FromStr for CauseKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(Self::Request),
            "offer" => Ok(Self::Offer),
            other => Err(TypeError::UnknownCauseKind(other.to_string())),
        }
    }
}

/// Participant bounds of an offering.
///
/// `current_participants` is derived: it always equals the number of
/// accepted enrollments and never exceeds `max_participants`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub max_participants: u32,
    pub current_participants: u32,
}

impl Capacity {
    /// An empty offering with room for `max_participants`.
    pub fn new(max_participants: u32) -> Self {
        Self {
            max_participants,
            current_participants: 0,
        }
    }

    /// Build a capacity with a known participant count, rejecting overbooking.
    pub fn with_current(max_participants: u32, current_participants: u32) -> Result<Self, TypeError> {
        if current_participants > max_participants {
            return Err(TypeError::InvalidCapacity {
                current: current_participants,
                max: max_participants,
            });
        }
        Ok(Self {
            max_participants,
            current_participants,
        })
    }

    /// Seats still available.
    pub fn remaining(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }

    /// Whether `accepted` participants leave room for one more.
    pub fn admits_one_more(&self, accepted: u32) -> bool {
        accepted < self.max_participants
    }
}

/// A request or offer of aid posted by a user.
///
/// A cause carrying a [`Capacity`] is an *offering* (course, training slot)
/// and accepts enrollments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cause {
    pub id: CauseId,
    pub owner: UserId,
    pub kind: CauseKind,
    pub title: String,
    /// Denormalized count of liked interactions.
    pub like_count: u64,
    pub capacity: Option<Capacity>,
    pub created_at: Timestamp,
}

impl Cause {
    /// A new cause with no likes and no capacity.
    pub fn new(owner: UserId, kind: CauseKind, title: impl Into<String>) -> Self {
        Self {
            id: CauseId::new(),
            owner,
            kind,
            title: title.into(),
            like_count: 0,
            capacity: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// A new capacity-bounded offering.
    pub fn offering(owner: UserId, title: impl Into<String>, max_participants: u32) -> Self {
        Self {
            capacity: Some(Capacity::new(max_participants)),
            ..Self::new(owner, CauseKind::Offer, title)
        }
    }

    pub fn is_offering(&self) -> bool {
        self.capacity.is_some()
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner == *user
    }
}
