use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::{Mutex as RowMutex, OwnedMutexGuard};

use aid_types::{Capacity, Cause, CauseId, Enrollment, EnrollmentId, EnrollmentStatus, LikeInteraction, UserId, UserProfile};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::{LedgerStore, LedgerTransaction};

/// Key of a lockable row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum RowKey {
    Cause(CauseId),
    Enrollment(EnrollmentId),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cause(id) => write!(f, "cause:{id}"),
            Self::Enrollment(id) => write!(f, "enrollment:{id}"),
        }
    }
}

#[derive(Default)]
struct Tables {
    causes: HashMap<CauseId, Cause>,
    likes: HashMap<CauseId, HashMap<UserId, LikeInteraction>>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    enrollment_pairs: HashMap<(UserId, CauseId), EnrollmentId>,
    users: HashMap<UserId, UserProfile>,
}

struct Shared {
    config: StoreConfig,
    tables: RwLock<Tables>,
    row_locks: Mutex<HashMap<RowKey, Arc<RowMutex<()>>>>,
}

impl Shared {
    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned("tables"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned("tables"))
    }

    /// Wait for the row lock of `key`, bounded by the configured timeout.
    async fn acquire(&self, key: RowKey) -> StoreResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .row_locks
                .lock()
                .map_err(|_| StoreError::Poisoned("row locks"))?;
            locks.entry(key).or_default().clone()
        };

        let waited = self.config.lock_timeout;
        tokio::time::timeout(waited, lock.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout {
                row: key.to_string(),
                waited,
            })
    }

    fn forget_locks(&self, keys: impl IntoIterator<Item = RowKey>) -> StoreResult<()> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| StoreError::Poisoned("row locks"))?;
        for key in keys {
            locks.remove(&key);
        }
        Ok(())
    }
}

/// In-memory ledger store for tests, local demos, and embedding.
///
/// Committed rows live behind a `RwLock` that is only held for the duration
/// of a single read or of a commit. Row locks are per-row async mutexes held
/// by the owning [`MemoryTransaction`] until it commits or is dropped, so two
/// transactions on the same cause serialize while transactions on different
/// causes never contend.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    shared: Arc<Shared>,
}

impl InMemoryLedgerStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                tables: RwLock::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Number of causes currently stored.
    pub fn cause_count(&self) -> StoreResult<usize> {
        Ok(self.shared.read()?.causes.len())
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let causes = self.cause_count().unwrap_or_default();
        f.debug_struct("InMemoryLedgerStore")
            .field("cause_count", &causes)
            .field("lock_timeout", &self.shared.config.lock_timeout)
            .finish()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        Ok(MemoryTransaction::new(self.shared.clone()))
    }

    async fn cause(&self, id: &CauseId) -> StoreResult<Option<Cause>> {
        Ok(self.shared.read()?.causes.get(id).cloned())
    }

    async fn like_snapshot(
        &self,
        user: &UserId,
        cause: &CauseId,
    ) -> StoreResult<Option<(Cause, Option<LikeInteraction>)>> {
        let tables = self.shared.read()?;
        let Some(row) = tables.causes.get(cause) else {
            return Ok(None);
        };
        let like = tables
            .likes
            .get(cause)
            .and_then(|rows| rows.get(user))
            .cloned();
        Ok(Some((row.clone(), like)))
    }

    async fn enrollment(&self, id: &EnrollmentId) -> StoreResult<Option<Enrollment>> {
        Ok(self.shared.read()?.enrollments.get(id).cloned())
    }

    async fn enrollments_for(&self, offering: &CauseId) -> StoreResult<Vec<Enrollment>> {
        let tables = self.shared.read()?;
        let mut rows: Vec<Enrollment> = tables
            .enrollments
            .values()
            .filter(|e| e.offering == *offering)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn user_profiles(&self, ids: &[UserId]) -> StoreResult<Vec<UserProfile>> {
        let tables = self.shared.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn insert_cause(&self, cause: Cause) -> StoreResult<()> {
        if cause.like_count != 0 {
            return Err(StoreError::Constraint(format!(
                "cause {} provisioned with like_count {} but no like rows",
                cause.id, cause.like_count
            )));
        }
        if let Some(capacity) = cause.capacity {
            if capacity.current_participants != 0 {
                return Err(StoreError::Constraint(format!(
                    "offering {} provisioned with {} participants but no enrollments",
                    cause.id, capacity.current_participants
                )));
            }
        }

        let _guard = self.shared.acquire(RowKey::Cause(cause.id)).await?;
        let mut tables = self.shared.write()?;
        if tables.causes.contains_key(&cause.id) {
            return Err(StoreError::UniqueViolation(format!("cause {}", cause.id)));
        }
        tables.causes.insert(cause.id, cause);
        Ok(())
    }

    async fn remove_cause(&self, id: &CauseId) -> StoreResult<bool> {
        let guard = self.shared.acquire(RowKey::Cause(*id)).await?;
        let removed_enrollments = {
            let mut tables = self.shared.write()?;
            if tables.causes.remove(id).is_none() {
                return Ok(false);
            }
            tables.likes.remove(id);
            let doomed: Vec<EnrollmentId> = tables
                .enrollments
                .values()
                .filter(|e| e.offering == *id)
                .map(|e| e.id)
                .collect();
            for enrollment_id in &doomed {
                if let Some(e) = tables.enrollments.remove(enrollment_id) {
                    tables.enrollment_pairs.remove(&(e.user, e.offering));
                }
            }
            doomed
        };
        drop(guard);

        tracing::debug!(cause = %id, enrollments = removed_enrollments.len(), "removed cause");
        self.shared.forget_locks(
            std::iter::once(RowKey::Cause(*id))
                .chain(removed_enrollments.into_iter().map(RowKey::Enrollment)),
        )?;
        Ok(true)
    }

    async fn upsert_user(&self, profile: UserProfile) -> StoreResult<()> {
        self.shared.write()?.users.insert(profile.id, profile);
        Ok(())
    }
}

/// Transaction over an [`InMemoryLedgerStore`].
///
/// Writes are staged locally and applied under the table write lock in
/// [`commit`](LedgerTransaction::commit). Dropping the transaction discards
/// staged writes and releases its row locks.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    guards: HashMap<RowKey, OwnedMutexGuard<()>>,
    causes: HashMap<CauseId, Cause>,
    likes: HashMap<(UserId, CauseId), LikeInteraction>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    inserted: Vec<EnrollmentId>,
}

impl MemoryTransaction {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            guards: HashMap::new(),
            causes: HashMap::new(),
            likes: HashMap::new(),
            enrollments: HashMap::new(),
            inserted: Vec::new(),
        }
    }

    async fn lock(&mut self, key: RowKey) -> StoreResult<()> {
        if !self.guards.contains_key(&key) {
            let guard = self.shared.acquire(key).await?;
            self.guards.insert(key, guard);
        }
        Ok(())
    }

    fn require_lock(&self, key: RowKey) -> StoreResult<()> {
        if self.guards.contains_key(&key) {
            Ok(())
        } else {
            Err(StoreError::NotLocked { row: key.to_string() })
        }
    }

    fn current_enrollment(&self, id: &EnrollmentId) -> StoreResult<Option<Enrollment>> {
        if let Some(staged) = self.enrollments.get(id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.shared.read()?.enrollments.get(id).cloned())
    }

    /// Number of writes staged so far.
    pub fn pending_writes(&self) -> usize {
        self.causes.len() + self.likes.len() + self.enrollments.len()
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn lock_cause(&mut self, id: &CauseId) -> StoreResult<Option<Cause>> {
        self.lock(RowKey::Cause(*id)).await?;
        if let Some(staged) = self.causes.get(id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.shared.read()?.causes.get(id).cloned())
    }

    async fn lock_enrollment(&mut self, id: &EnrollmentId) -> StoreResult<Option<Enrollment>> {
        self.lock(RowKey::Enrollment(*id)).await?;
        self.current_enrollment(id)
    }

    async fn update_cause(&mut self, cause: &Cause) -> StoreResult<()> {
        self.require_lock(RowKey::Cause(cause.id))?;
        if let Some(capacity) = cause.capacity {
            Capacity::with_current(capacity.max_participants, capacity.current_participants)
                .map_err(|e| StoreError::Constraint(format!("offering {}: {e}", cause.id)))?;
        }
        self.causes.insert(cause.id, cause.clone());
        Ok(())
    }

    async fn find_like(&mut self, user: &UserId, cause: &CauseId) -> StoreResult<Option<LikeInteraction>> {
        if let Some(staged) = self.likes.get(&(*user, *cause)) {
            return Ok(Some(staged.clone()));
        }
        let tables = self.shared.read()?;
        Ok(tables
            .likes
            .get(cause)
            .and_then(|rows| rows.get(user))
            .cloned())
    }

    async fn put_like(&mut self, like: &LikeInteraction) -> StoreResult<()> {
        self.require_lock(RowKey::Cause(like.cause))?;
        self.likes.insert((like.user, like.cause), like.clone());
        Ok(())
    }

    async fn count_liked(&mut self, cause: &CauseId) -> StoreResult<u64> {
        let tables = self.shared.read()?;
        let committed = tables
            .likes
            .get(cause)
            .map(|rows| {
                rows.values()
                    .filter(|row| !self.likes.contains_key(&(row.user, *cause)))
                    .filter(|row| row.is_liked)
                    .count()
            })
            .unwrap_or(0);
        let staged = self
            .likes
            .values()
            .filter(|row| row.cause == *cause && row.is_liked)
            .count();
        Ok((committed + staged) as u64)
    }

    async fn find_enrollment(&mut self, user: &UserId, offering: &CauseId) -> StoreResult<Option<Enrollment>> {
        if let Some(staged) = self
            .enrollments
            .values()
            .find(|e| e.user == *user && e.offering == *offering)
        {
            return Ok(Some(staged.clone()));
        }
        let tables = self.shared.read()?;
        Ok(tables
            .enrollment_pairs
            .get(&(*user, *offering))
            .and_then(|id| tables.enrollments.get(id))
            .cloned())
    }

    async fn insert_enrollment(&mut self, enrollment: &Enrollment) -> StoreResult<()> {
        self.require_lock(RowKey::Cause(enrollment.offering))?;
        if self
            .find_enrollment(&enrollment.user, &enrollment.offering)
            .await?
            .is_some()
        {
            return Err(StoreError::UniqueViolation(format!(
                "enrollment for user {} on offering {}",
                enrollment.user, enrollment.offering
            )));
        }
        if self.current_enrollment(&enrollment.id)?.is_some() {
            return Err(StoreError::UniqueViolation(format!("enrollment {}", enrollment.id)));
        }
        self.enrollments.insert(enrollment.id, enrollment.clone());
        self.inserted.push(enrollment.id);
        Ok(())
    }

    async fn update_enrollment(&mut self, enrollment: &Enrollment) -> StoreResult<()> {
        self.require_lock(RowKey::Cause(enrollment.offering))?;
        self.require_lock(RowKey::Enrollment(enrollment.id))?;
        let existing = self
            .current_enrollment(&enrollment.id)?
            .ok_or_else(|| StoreError::MissingRow(format!("enrollment {}", enrollment.id)))?;
        if existing.user != enrollment.user || existing.offering != enrollment.offering {
            return Err(StoreError::Constraint(format!(
                "enrollment {} cannot change user or offering",
                enrollment.id
            )));
        }
        self.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(())
    }

    async fn count_accepted(&mut self, offering: &CauseId) -> StoreResult<u32> {
        let tables = self.shared.read()?;
        let committed = tables
            .enrollments
            .values()
            .filter(|e| e.offering == *offering && !self.enrollments.contains_key(&e.id))
            .filter(|e| e.status == EnrollmentStatus::Accepted)
            .count();
        let staged = self
            .enrollments
            .values()
            .filter(|e| e.offering == *offering && e.status == EnrollmentStatus::Accepted)
            .count();
        Ok((committed + staged) as u32)
    }

    async fn commit(self) -> StoreResult<()> {
        let writes = self.pending_writes();
        let MemoryTransaction {
            shared,
            guards,
            causes,
            likes,
            enrollments,
            inserted,
        } = self;

        {
            let mut tables = shared.write()?;

            if let Some(missing) = causes.keys().find(|id| !tables.causes.contains_key(*id)) {
                return Err(StoreError::MissingRow(format!("cause {missing}")));
            }
            for id in &inserted {
                let Some(e) = enrollments.get(id) else { continue };
                if tables.enrollment_pairs.contains_key(&(e.user, e.offering)) {
                    return Err(StoreError::UniqueViolation(format!(
                        "enrollment for user {} on offering {}",
                        e.user, e.offering
                    )));
                }
            }

            tables.causes.extend(causes);
            for ((user, cause), like) in likes {
                tables.likes.entry(cause).or_default().insert(user, like);
            }
            for (id, enrollment) in enrollments {
                tables
                    .enrollment_pairs
                    .insert((enrollment.user, enrollment.offering), id);
                tables.enrollments.insert(id, enrollment);
            }
        }

        drop(guards);
        tracing::trace!(writes, "transaction committed");
        Ok(())
    }
}
