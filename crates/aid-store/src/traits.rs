use async_trait::async_trait;

use aid_types::{Cause, CauseId, Enrollment, EnrollmentId, LikeInteraction, UserId, UserProfile};

use crate::error::StoreResult;

/// Transactional relational store backing the engagement components.
///
/// All implementations must satisfy these invariants:
/// - Rows of a cause (the cause itself, its like interactions, its
///   enrollments) are only mutated inside a [`LedgerTransaction`] that holds
///   the cause's row lock.
/// - A transaction's writes become visible atomically at
///   [`LedgerTransaction::commit`]; dropping the transaction discards them.
/// - At most one enrollment exists per (user, offering) and at most one like
///   interaction per (user, cause).
/// - Removing a cause removes its like interactions and enrollments.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTransaction;

    /// Open a transaction. No locks are held until the first `lock_*` call.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Committed state of a cause, without locking.
    async fn cause(&self, id: &CauseId) -> StoreResult<Option<Cause>>;

    /// Committed cause row together with `user`'s like on it, read from one
    /// snapshot so the counter and the row agree. `None` if the cause is absent.
    async fn like_snapshot(
        &self,
        user: &UserId,
        cause: &CauseId,
    ) -> StoreResult<Option<(Cause, Option<LikeInteraction>)>>;

    /// Committed state of an enrollment, without locking.
    async fn enrollment(&self, id: &EnrollmentId) -> StoreResult<Option<Enrollment>>;

    /// All committed enrollments of an offering, oldest first.
    async fn enrollments_for(&self, offering: &CauseId) -> StoreResult<Vec<Enrollment>>;

    /// Profiles for the given users; unknown users are skipped.
    async fn user_profiles(&self, ids: &[UserId]) -> StoreResult<Vec<UserProfile>>;

    /// Provision a cause. Counters must agree with the (empty) row set.
    async fn insert_cause(&self, cause: Cause) -> StoreResult<()>;

    /// Remove a cause together with its likes and enrollments.
    /// Returns `true` if the cause existed.
    async fn remove_cause(&self, id: &CauseId) -> StoreResult<bool>;

    /// Insert or replace a user profile.
    async fn upsert_user(&self, profile: UserProfile) -> StoreResult<()>;
}

/// A single atomic read-modify-write scope.
///
/// Lock order is cause row first, then enrollment row. Reads observe the
/// transaction's own uncommitted writes.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Lock a cause row (`SELECT ... FOR UPDATE`) and return its current state.
    async fn lock_cause(&mut self, id: &CauseId) -> StoreResult<Option<Cause>>;

    /// Lock an enrollment row and return its current state.
    async fn lock_enrollment(&mut self, id: &EnrollmentId) -> StoreResult<Option<Enrollment>>;

    /// Persist a modified cause. Requires the cause lock.
    async fn update_cause(&mut self, cause: &Cause) -> StoreResult<()>;

    async fn find_like(&mut self, user: &UserId, cause: &CauseId) -> StoreResult<Option<LikeInteraction>>;

    /// Insert or update a like interaction. Requires the cause lock.
    async fn put_like(&mut self, like: &LikeInteraction) -> StoreResult<()>;

    /// Number of interactions on `cause` with `is_liked = true`.
    async fn count_liked(&mut self, cause: &CauseId) -> StoreResult<u64>;

    async fn find_enrollment(&mut self, user: &UserId, offering: &CauseId) -> StoreResult<Option<Enrollment>>;

    /// Insert a new enrollment. Requires the offering lock; fails with
    /// `UniqueViolation` if (user, offering) already has a row.
    async fn insert_enrollment(&mut self, enrollment: &Enrollment) -> StoreResult<()>;

    /// Update an existing enrollment. Requires both the offering and the
    /// enrollment lock.
    async fn update_enrollment(&mut self, enrollment: &Enrollment) -> StoreResult<()>;

    /// Number of enrollments of `offering` with status `accepted`.
    async fn count_accepted(&mut self, offering: &CauseId) -> StoreResult<u32>;

    /// Apply all writes atomically and release every lock.
    async fn commit(self) -> StoreResult<()>;
}
