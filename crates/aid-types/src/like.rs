use serde::{Deserialize, Serialize};

use crate::ids::{CauseId, UserId};
use crate::Timestamp;

/// One user's like state on one cause.
///
/// Rows are created on the first toggle and flipped afterwards, never
/// deleted. A missing row reads as "not liked".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInteraction {
    pub user: UserId,
    pub cause: CauseId,
    pub is_liked: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LikeInteraction {
    /// The row written on a user's first toggle.
    pub fn first_like(user: UserId, cause: CauseId) -> Self {
        let now = chrono::Utc::now();
        Self {
            user,
            cause,
            is_liked: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flip the like state in place.
    pub fn toggle(&mut self) {
        self.is_liked = !self.is_liked;
        self.updated_at = chrono::Utc::now();
    }
}

/// The caller's like state together with the cause's aggregate count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: u64,
}
