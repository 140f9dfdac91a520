use std::sync::Arc;

use tracing::debug;

use aid_store::{LedgerStore, LedgerTransaction};
use aid_types::{ActivityKind, ActivityLogEntry, CauseId, LikeInteraction, LikeStatus, UserId};

use crate::activity::{record_best_effort, ActivityLog};
use crate::error::{EngagementError, EngagementResult};

/// Per-user like state on causes, with an exact aggregate counter.
///
/// The counter on the cause is recomputed from the liked rows inside the
/// same transaction that flips the row, under the cause's row lock. It is
/// never adjusted incrementally.
pub struct InteractionLedger<S> {
    store: Arc<S>,
    activity: Arc<dyn ActivityLog>,
}

impl<S> Clone for InteractionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            activity: Arc::clone(&self.activity),
        }
    }
}

impl<S: LedgerStore> InteractionLedger<S> {
    pub fn new(store: Arc<S>, activity: Arc<dyn ActivityLog>) -> Self {
        Self { store, activity }
    }

    /// Flip `user`'s like on `cause` and return the new state and count.
    pub async fn toggle_like(&self, user: &UserId, cause: &CauseId) -> EngagementResult<LikeStatus> {
        let mut tx = self.store.begin().await?;
        let mut row = tx
            .lock_cause(cause)
            .await?
            .ok_or_else(|| EngagementError::cause_not_found(cause))?;

        let like = match tx.find_like(user, cause).await? {
            Some(mut existing) => {
                existing.toggle();
                existing
            }
            None => LikeInteraction::first_like(*user, *cause),
        };
        tx.put_like(&like).await?;

        row.like_count = tx.count_liked(cause).await?;
        tx.update_cause(&row).await?;
        tx.commit().await?;

        let status = LikeStatus {
            liked: like.is_liked,
            like_count: row.like_count,
        };
        debug!(%user, %cause, liked = status.liked, like_count = status.like_count, "like toggled");

        let entry = ActivityLogEntry::new(*user, *cause, ActivityKind::like(status.liked))
            .with("likeCount", status.like_count);
        record_best_effort(self.activity.as_ref(), entry).await;

        Ok(status)
    }

    /// Current like state of `user` on `cause`. No side effects.
    pub async fn like_status(&self, user: &UserId, cause: &CauseId) -> EngagementResult<LikeStatus> {
        let (row, like) = self
            .store
            .like_snapshot(user, cause)
            .await?
            .ok_or_else(|| EngagementError::cause_not_found(cause))?;
        Ok(LikeStatus {
            liked: like.is_some_and(|like| like.is_liked),
            like_count: row.like_count,
        })
    }
}
