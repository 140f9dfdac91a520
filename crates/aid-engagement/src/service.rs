use std::sync::Arc;

use aid_store::LedgerStore;

use crate::activity::ActivityLog;
use crate::enrollment::EnrollmentManager;
use crate::interaction::InteractionLedger;

/// Both engagement components wired to one store and one activity log.
pub struct Engagement<S> {
    pub likes: InteractionLedger<S>,
    pub enrollments: EnrollmentManager<S>,
}

impl<S> Clone for Engagement<S> {
    fn clone(&self) -> Self {
        Self {
            likes: self.likes.clone(),
            enrollments: self.enrollments.clone(),
        }
    }
}

impl<S: LedgerStore> Engagement<S> {
    pub fn new(store: Arc<S>, activity: Arc<dyn ActivityLog>) -> Self {
        Self {
            likes: InteractionLedger::new(Arc::clone(&store), Arc::clone(&activity)),
            enrollments: EnrollmentManager::new(store, activity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aid_store::InMemoryLedgerStore;
    use aid_types::{Actor, Cause, EnrollmentStatus, UserId};

    use crate::activity::InMemoryActivityLog;

    #[tokio::test]
    async fn likes_and_enrollments_share_one_log() {
        let store = Arc::new(InMemoryLedgerStore::default());
        let log = Arc::new(InMemoryActivityLog::new());
        let engagement = Engagement::new(store.clone(), log.clone());

        let owner = Actor::user(UserId::new());
        let offering = Cause::offering(owner.user, "Community garden shift", 4);
        let id = offering.id;
        store.insert_cause(offering).await.unwrap();

        let user = UserId::new();
        engagement.likes.toggle_like(&user, &id).await.unwrap();
        let enrollment = engagement
            .enrollments
            .request_enrollment(&user, &id, None)
            .await
            .unwrap();
        engagement
            .enrollments
            .review_enrollment(&owner, &enrollment, EnrollmentStatus::Accepted, None)
            .await
            .unwrap();

        let cause = store.cause(&id).await.unwrap().unwrap();
        assert_eq!(cause.like_count, 1);
        assert_eq!(cause.capacity.unwrap().current_participants, 1);
        assert_eq!(log.for_cause(&id).len(), 3);
    }
}
