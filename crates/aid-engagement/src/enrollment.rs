use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use aid_store::{LedgerStore, LedgerTransaction};
use aid_types::{
    ActivityKind, ActivityLogEntry, Actor, Cause, CauseId, Enrollment, EnrollmentId,
    EnrollmentStatus, UserId,
};

use crate::activity::{record_best_effort, ActivityLog};
use crate::error::{EngagementError, EngagementResult};
use crate::view::{CapacityStats, EnrollmentDetail, EnrollmentView};

/// Longest accepted `notes` / `adminNotes` value, in characters.
pub const MAX_NOTES_LEN: usize = 2000;

/// Who is driving a status change, and therefore what they may do.
#[derive(Clone, Copy, Debug)]
enum Authority {
    /// Offering owner or administrator: any transition.
    Moderator(Actor),
    /// The enrolled user: cancellation of their own enrollment only.
    Enrollee(UserId),
}

impl Authority {
    fn user(&self) -> UserId {
        match self {
            Self::Moderator(actor) => actor.user,
            Self::Enrollee(user) => *user,
        }
    }

    fn check(&self, offering: &Cause, enrollment: &Enrollment) -> EngagementResult<()> {
        match self {
            Self::Moderator(actor) if actor.is_admin || offering.is_owned_by(&actor.user) => Ok(()),
            Self::Moderator(actor) => Err(EngagementError::Forbidden(format!(
                "user {} may not moderate offering {}",
                actor.user, offering.id
            ))),
            Self::Enrollee(user) if enrollment.user == *user => Ok(()),
            Self::Enrollee(user) => Err(EngagementError::Forbidden(format!(
                "user {user} does not own enrollment {}",
                enrollment.id
            ))),
        }
    }
}

/// What [`EnrollmentManager::list_enrollments`] may reveal to a requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewCapability {
    Full,
    CountOnly,
}

impl ViewCapability {
    fn for_requester(offering: &Cause, requester: &UserId) -> Self {
        if offering.is_owned_by(requester) {
            Self::Full
        } else {
            Self::CountOnly
        }
    }
}

/// Trim `value`, map blank to `None`, and enforce [`MAX_NOTES_LEN`].
fn normalize_notes(field: &str, value: Option<String>) -> EngagementResult<Option<String>> {
    let Some(raw) = value else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_NOTES_LEN {
        return Err(EngagementError::Validation(format!(
            "{field} must be at most {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Registration lifecycle for capacity-bounded offerings.
///
/// Every status change runs in one transaction that locks the offering row
/// and then the enrollment row. Acceptance checks headroom against a fresh
/// count of accepted rows, and `current_participants` is always rewritten
/// from that count.
pub struct EnrollmentManager<S> {
    store: Arc<S>,
    activity: Arc<dyn ActivityLog>,
}

impl<S> Clone for EnrollmentManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            activity: Arc::clone(&self.activity),
        }
    }
}

impl<S: LedgerStore> EnrollmentManager<S> {
    pub fn new(store: Arc<S>, activity: Arc<dyn ActivityLog>) -> Self {
        Self { store, activity }
    }

    /// File a `pending` enrollment for `user` on `offering`.
    ///
    /// Capacity is not checked here; only acceptance is bounded.
    pub async fn request_enrollment(
        &self,
        user: &UserId,
        offering: &CauseId,
        notes: Option<String>,
    ) -> EngagementResult<EnrollmentId> {
        let notes = normalize_notes("notes", notes)?;

        let mut tx = self.store.begin().await?;
        let cause = tx
            .lock_cause(offering)
            .await?
            .filter(Cause::is_offering)
            .ok_or_else(|| EngagementError::offering_not_found(offering))?;

        if tx.find_enrollment(user, offering).await?.is_some() {
            return Err(EngagementError::Duplicate {
                user: *user,
                offering: *offering,
            });
        }

        let enrollment = Enrollment::request(*user, cause.id, notes);
        tx.insert_enrollment(&enrollment).await?;
        tx.commit().await?;

        info!(%user, %offering, enrollment = %enrollment.id, "enrollment requested");
        let entry = ActivityLogEntry::new(*user, *offering, ActivityKind::EnrollRequested)
            .with("enrollmentId", enrollment.id.to_string());
        record_best_effort(self.activity.as_ref(), entry).await;

        Ok(enrollment.id)
    }

    /// Move an enrollment to `new_status` on behalf of a moderator (offering
    /// owner or administrator).
    pub async fn review_enrollment(
        &self,
        reviewer: &Actor,
        enrollment: &EnrollmentId,
        new_status: EnrollmentStatus,
        admin_notes: Option<String>,
    ) -> EngagementResult<Enrollment> {
        let admin_notes = normalize_notes("adminNotes", admin_notes)?;
        self.transition(Authority::Moderator(*reviewer), enrollment, new_status, admin_notes)
            .await
    }

    /// Cancel `user`'s own pending or accepted enrollment.
    pub async fn withdraw_enrollment(
        &self,
        user: &UserId,
        enrollment: &EnrollmentId,
    ) -> EngagementResult<Enrollment> {
        self.transition(
            Authority::Enrollee(*user),
            enrollment,
            EnrollmentStatus::Cancelled,
            None,
        )
        .await
    }

    /// Enrollments of `offering` as far as `requester` may see them.
    pub async fn list_enrollments(
        &self,
        offering: &CauseId,
        requester: &UserId,
    ) -> EngagementResult<EnrollmentView> {
        let cause = self
            .store
            .cause(offering)
            .await?
            .filter(Cause::is_offering)
            .ok_or_else(|| EngagementError::offering_not_found(offering))?;
        let rows = self.store.enrollments_for(offering).await?;

        let view = match ViewCapability::for_requester(&cause, requester) {
            ViewCapability::CountOnly => EnrollmentView::CountOnly {
                offering: *offering,
                total: rows.len(),
            },
            ViewCapability::Full => {
                let capacity = cause.capacity.ok_or_else(|| {
                    EngagementError::Internal(format!("offering {offering} lost its capacity"))
                })?;
                let stats = CapacityStats::new(capacity, &rows);

                let ids: Vec<UserId> = rows.iter().map(|e| e.user).collect();
                let mut profiles: HashMap<UserId, _> = self
                    .store
                    .user_profiles(&ids)
                    .await?
                    .into_iter()
                    .map(|p| (p.id, p))
                    .collect();

                let enrollments = rows
                    .into_iter()
                    .map(|enrollment| EnrollmentDetail {
                        user_profile: profiles.remove(&enrollment.user),
                        enrollment,
                    })
                    .collect();

                EnrollmentView::Full {
                    offering: *offering,
                    enrollments,
                    stats,
                }
            }
        };

        debug!(%offering, %requester, full = view.is_full(), total = view.total(), "enrollments listed");
        Ok(view)
    }

    async fn transition(
        &self,
        authority: Authority,
        id: &EnrollmentId,
        next: EnrollmentStatus,
        admin_notes: Option<String>,
    ) -> EngagementResult<Enrollment> {
        // The offering is locked before the enrollment, so look it up first.
        let offering = self
            .store
            .enrollment(id)
            .await?
            .ok_or_else(|| EngagementError::enrollment_not_found(id))?
            .offering;

        let mut tx = self.store.begin().await?;
        let mut cause = tx
            .lock_cause(&offering)
            .await?
            .ok_or_else(|| EngagementError::enrollment_not_found(id))?;
        let mut row = tx
            .lock_enrollment(id)
            .await?
            .ok_or_else(|| EngagementError::enrollment_not_found(id))?;

        authority.check(&cause, &row)?;

        let previous = row.status;
        if !previous.can_transition_to(next) {
            return Err(EngagementError::InvalidTransition {
                from: previous,
                to: next,
            });
        }

        let mut capacity = cause.capacity.ok_or_else(|| {
            EngagementError::Internal(format!("enrollment {id} belongs to non-offering {offering}"))
        })?;

        if next.holds_seat() {
            let accepted = tx.count_accepted(&offering).await?;
            if !capacity.admits_one_more(accepted) {
                debug!(%offering, accepted, max = capacity.max_participants, "offering full");
                return Err(EngagementError::CapacityExceeded {
                    offering,
                    max: capacity.max_participants,
                });
            }
        }

        row.status = next;
        if admin_notes.is_some() {
            row.admin_notes = admin_notes;
        }
        row.updated_at = chrono::Utc::now();
        tx.update_enrollment(&row).await?;

        if previous.holds_seat() || next.holds_seat() {
            capacity.current_participants = tx.count_accepted(&offering).await?;
            cause.capacity = Some(capacity);
            tx.update_cause(&cause).await?;
        }
        tx.commit().await?;

        let actor = authority.user();
        info!(
            enrollment = %id,
            %offering,
            %actor,
            from = %previous,
            to = %next,
            participants = capacity.current_participants,
            "enrollment status changed"
        );
        let entry = ActivityLogEntry::new(row.user, offering, ActivityKind::Enroll(next))
            .with("enrollmentId", id.to_string())
            .with("from", previous.as_str())
            .with("actor", actor.to_string())
            .with("currentParticipants", capacity.current_participants);
        record_best_effort(self.activity.as_ref(), entry).await;

        Ok(row)
    }
}
